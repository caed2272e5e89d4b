//! Status command implementation.

use super::open_dashboard;
use super::stats::print_filter_line;
use crate::config::{load_config, resolve_token};
use crate::error::Result;
use crate::model::BoardRef;
use crate::pipeline::Filter;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for status command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput<'a> {
    selected_board: Option<BoardRef>,
    cached_board: Option<BoardRef>,
    cached_issue_count: usize,
    matching_issue_count: usize,
    last_fetch: Option<DateTime<Utc>>,
    cache_hash: Option<String>,
    known_boards: usize,
    boards_synced_at: Option<DateTime<Utc>>,
    token_configured: bool,
    token_source: Option<&'static str>,
    filter: &'a Filter,
}

/// Execute status command.
///
/// Reports what is cached and selected; never contacts GitHub.
///
/// # Errors
///
/// Returns an error if the database or config file cannot be read.
pub fn execute(db_path: Option<&PathBuf>, token: Option<&str>, json: bool) -> Result<()> {
    let dashboard = open_dashboard(db_path)?;
    let storage = dashboard.storage();
    let config = load_config()?;
    let token_source = resolve_token(token, &config).ok().map(|(_, s)| s.as_str());

    let output = StatusOutput {
        selected_board: storage.selected_board()?,
        cached_board: storage.cached_board()?,
        cached_issue_count: dashboard.issues().len(),
        matching_issue_count: dashboard.filtered().len(),
        last_fetch: storage.last_fetch()?,
        cache_hash: storage.issues_hash()?,
        known_boards: storage.boards()?.len(),
        boards_synced_at: storage.boards_synced_at()?,
        token_configured: token_source.is_some(),
        token_source,
        filter: dashboard.filter(),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Board Pulse Status".bold());
    println!("==================");
    println!();

    match &output.selected_board {
        Some(board) => println!("Board:   {} (#{})", board.label(), board.number),
        None => println!("Board:   {}", "none selected".yellow()),
    }
    match output.boards_synced_at {
        Some(at) => println!(
            "Known:   {} board(s), synced {}",
            output.known_boards,
            at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("Known:   {} board(s)", output.known_boards),
    }
    match output.token_source {
        Some(source) => println!("Token:   {} ({source})", "configured".green()),
        None => println!("Token:   {}", "missing".red()),
    }
    println!();

    match output.last_fetch {
        Some(at) => {
            println!(
                "Cache:   {} issues, fetched {}",
                output.cached_issue_count,
                at.format("%Y-%m-%d %H:%M UTC")
            );
            if let Some(board) = &output.cached_board {
                let stale = output
                    .selected_board
                    .as_ref()
                    .is_some_and(|s| !s.matches(&board.owner, board.number));
                let note = if stale { " (not the selected board)" } else { "" };
                println!("  From:  {}{}", board.label(), note.yellow());
            }
            if let Some(hash) = &output.cache_hash {
                println!("  Hash:  {}", hash.chars().take(12).collect::<String>().dimmed());
            }
        }
        None => println!("Cache:   {}", "empty".dimmed()),
    }
    print_filter_line(output.filter);
    println!(
        "Showing {} of {} cached issues.",
        output.matching_issue_count, output.cached_issue_count
    );

    if output.selected_board.is_none() {
        println!();
        println!("Discover boards with: pulse boards sync");
    } else if output.last_fetch.is_none() {
        println!();
        println!("Load issues with: pulse fetch");
    }

    Ok(())
}
