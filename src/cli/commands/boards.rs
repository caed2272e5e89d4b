//! Board discovery and selection.

use super::{github_client, open_storage, runtime};
use crate::cli::BoardsCommands;
use crate::error::{Error, Result};
use crate::model::BoardRef;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct BoardListOutput<'a> {
    count: usize,
    selected: Option<&'a BoardRef>,
    boards: &'a [BoardRef],
}

/// Execute a board command.
///
/// # Errors
///
/// Returns storage errors, and for `sync` any retrieval error.
pub fn execute(
    command: &BoardsCommands,
    db_path: Option<&PathBuf>,
    token: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        BoardsCommands::Sync => sync(db_path, token, json),
        BoardsCommands::List => list(db_path, json),
        BoardsCommands::Select { owner, number } => select(owner, *number, db_path, json),
    }
}

fn sync(db_path: Option<&PathBuf>, token: Option<&str>, json: bool) -> Result<()> {
    let client = github_client(token)?;
    let mut storage = open_storage(db_path)?;

    let boards = runtime()?.block_on(client.list_boards())?;
    storage.save_boards(&boards)?;
    tracing::info!(count = boards.len(), "Board list refreshed");

    // Keep the selection pointing at a board that still exists.
    let selected = storage
        .selected_board()?
        .filter(|s| boards.iter().any(|b| b.matches(&s.owner, s.number)));
    if selected.is_none() {
        if let [only] = boards.as_slice() {
            storage.select_board(only)?;
        }
    }

    print_boards(&boards, storage.selected_board()?.as_ref(), json)
}

fn list(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let boards = storage.boards()?;
    print_boards(&boards, storage.selected_board()?.as_ref(), json)
}

fn select(owner: &str, number: u32, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let board = storage
        .boards()?
        .into_iter()
        .find(|b| b.matches(owner, number))
        .ok_or_else(|| Error::BoardNotFound {
            owner: owner.to_string(),
            number,
        })?;

    storage.select_board(&board)?;

    if json {
        println!("{}", serde_json::to_string(&board)?);
    } else if crate::is_csv() {
        println!("owner,number,title,owner_type");
        print_csv_row(&board);
    } else {
        println!("Selected {}", board.label().bold());
        println!("Run `pulse fetch` to load its issues.");
    }
    Ok(())
}

fn print_boards(boards: &[BoardRef], selected: Option<&BoardRef>, json: bool) -> Result<()> {
    if json {
        let output = BoardListOutput {
            count: boards.len(),
            selected,
            boards,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if crate::is_csv() {
        println!("owner,number,title,owner_type");
        for board in boards {
            print_csv_row(board);
        }
        return Ok(());
    }

    if boards.is_empty() {
        println!("No boards known.");
        println!("Run `pulse boards sync` to discover boards.");
        return Ok(());
    }

    println!("Boards ({}):", boards.len());
    for board in boards {
        let is_selected = selected.is_some_and(|s| s.matches(&board.owner, board.number));
        let marker = if is_selected { "*".green().bold() } else { " ".normal() };
        println!(
            "{marker} {:<24} #{:<4} {} {}",
            board.owner,
            board.number,
            board.title,
            format!("({})", board.owner_type).dimmed()
        );
    }
    Ok(())
}

fn print_csv_row(board: &BoardRef) {
    println!(
        "{},{},{},{}",
        crate::csv_escape(&board.owner),
        board.number,
        crate::csv_escape(&board.title),
        board.owner_type
    );
}
