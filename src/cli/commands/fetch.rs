//! Fetch command implementation.
//!
//! Runs one retrieval pass for the selected board. Ctrl-C cancels the
//! in-flight request and keeps the previous cache.

use super::{github_client, open_dashboard, runtime};
use crate::error::{Error, Result};
use crate::pipeline::{FetchOrchestrator, Progress, RefreshSummary};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// Execute the fetch command.
///
/// # Errors
///
/// Returns configuration errors before any request, retrieval errors
/// (including [`Error::Cancelled`]) and storage errors.
pub fn execute(
    db_path: Option<&PathBuf>,
    token: Option<&str>,
    no_progress: bool,
    quiet: bool,
    json: bool,
) -> Result<()> {
    let mut dashboard = open_dashboard(db_path)?;
    let board = dashboard.selected_board()?;
    let client = github_client(token)?;

    let draw = !(json || quiet || no_progress);
    let orchestrator = FetchOrchestrator::new();

    let result = runtime()?.block_on(async {
        let cancel_on_signal = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                orchestrator.cancel();
            }
            std::future::pending::<()>().await;
        };

        tokio::select! {
            result = dashboard.refresh(&orchestrator, &client, &board, |p| {
                if draw {
                    draw_progress(&p);
                }
            }) => result,
            () = cancel_on_signal => Err(Error::Cancelled),
        }
    });

    if draw {
        eprintln!();
    }
    let summary = result?;

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else if crate::is_csv() {
        println!("board,issues,fetched,closed,malformed,changed,fetched_at");
        println!(
            "{},{},{},{},{},{},{}",
            crate::csv_escape(&summary.board.label()),
            summary.issue_count,
            summary.fetched,
            summary.closed,
            summary.malformed,
            summary.changed,
            summary.fetched_at.to_rfc3339()
        );
    } else if !quiet {
        print_summary(&summary);
    }

    Ok(())
}

fn draw_progress(progress: &Progress) {
    let status = progress.status.as_deref().unwrap_or_default();
    let line = match progress.detail.as_deref() {
        Some(detail) => format!("{status} ({detail})"),
        None => status.to_string(),
    };
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r\x1b[2K[{:>3.0}%] {line}", progress.percent);
    let _ = stderr.flush();
}

fn print_summary(summary: &RefreshSummary) {
    println!(
        "{} {} open issues from {}",
        "Fetched".green().bold(),
        summary.issue_count,
        summary.board.label().bold()
    );
    let mut skipped = Vec::new();
    if summary.closed > 0 {
        skipped.push(format!("{} closed", summary.closed));
    }
    if summary.malformed > 0 {
        skipped.push(format!("{} without issue content", summary.malformed));
    }
    if !skipped.is_empty() {
        println!("  Skipped {}", skipped.join(", "));
    }
    if !summary.changed {
        println!("  {}", "No changes since the last fetch".dimmed());
    }
    println!("  Filter cleared.");
}
