//! Stats command implementation.

use super::{format_estimate, open_dashboard};
use crate::error::Result;
use crate::model::UNSET;
use crate::pipeline::{AggregationResult, AssigneePage, Filter, Tally};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput<'a> {
    filter: &'a Filter,
    state: &'a [Tally<usize>],
    priority: &'a [Tally<usize>],
    milestone: &'a [Tally<usize>],
    assignee: AssigneePage<'a>,
    team_workload: &'a [Tally<f64>],
    total_workload: f64,
    no_estimation_count: usize,
    stats_issue_count: usize,
    total_issue_count: usize,
    cached_issue_count: usize,
}

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or output fails.
pub fn execute(db_path: Option<&PathBuf>, assignee_page: usize, json: bool) -> Result<()> {
    let dashboard = open_dashboard(db_path)?;
    let stats = dashboard.stats();
    let page = stats.assignee_page(assignee_page);

    if json {
        let output = StatsOutput {
            filter: dashboard.filter(),
            state: &stats.state,
            priority: &stats.priority,
            milestone: &stats.milestone,
            assignee: page,
            team_workload: &stats.team_workload,
            total_workload: stats.total_workload(),
            no_estimation_count: stats.no_estimation_count,
            stats_issue_count: stats.stats_issue_count,
            total_issue_count: stats.total_issue_count,
            cached_issue_count: dashboard.issues().len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if crate::is_csv() {
        print_csv(&stats);
        return Ok(());
    }

    if dashboard.issues().is_empty() {
        println!("No cached issues.");
        println!("Run `pulse fetch` to load the selected board.");
        return Ok(());
    }

    print_filter_line(dashboard.filter());
    println!();
    print_counts("State", &stats.state, dashboard.filter().state.as_deref());
    print_counts("Priority", &stats.priority, dashboard.filter().priority.as_deref());
    print_counts("Milestone", &stats.milestone, dashboard.filter().milestone.as_deref());

    let assignee = dashboard.filter().assignee.as_ref().map(ToString::to_string);
    print_counts(
        &format!("Assignees (page {}/{})", page.page, page.total_pages),
        page.entries,
        assignee.as_deref(),
    );
    print_workload(&stats, dashboard.filter());

    println!(
        "{}",
        format!(
            "Counted {} of {} issues; children listed with their parent are not counted twice.",
            stats.stats_issue_count, stats.total_issue_count
        )
        .dimmed()
    );
    Ok(())
}

pub(crate) fn print_filter_line(filter: &Filter) {
    let active = filter.describe();
    if active.is_empty() {
        println!("Filter: {}", "none".dimmed());
    } else {
        let parts: Vec<String> = active
            .iter()
            .map(|(facet, value)| format!("{facet}={value}"))
            .collect();
        println!("Filter: {}", parts.join(" + ").yellow());
    }
}

fn print_counts(title: &str, tallies: &[Tally<usize>], active: Option<&str>) {
    let total: usize = tallies.iter().map(|t| t.value).sum();
    println!("{} {}", title.cyan().bold(), format!("({total})").dimmed());
    for tally in tallies {
        let label = if active == Some(tally.label.as_str()) {
            format!("{} ✓", tally.label).yellow().bold()
        } else if tally.label == UNSET {
            tally.label.dimmed()
        } else {
            tally.label.normal()
        };
        println!("  {label:<28} {:>5}", tally.value);
    }
    println!();
}

fn print_workload(stats: &AggregationResult, filter: &Filter) {
    println!(
        "{} {}",
        "Workload".cyan().bold(),
        format!("({})", format_estimate(stats.total_workload())).dimmed()
    );
    for tally in &stats.team_workload {
        let active = filter.team.as_deref() == Some(tally.label.as_str())
            && filter.has_estimation == Some(true);
        let label = if active {
            format!("{} ✓", tally.label).yellow().bold()
        } else {
            tally.label.normal()
        };
        println!("  {label:<28} {:>5}", format_estimate(tally.value));
    }
    if stats.no_estimation_count > 0 {
        let label = if filter.has_estimation == Some(false) {
            "No estimate ✓".yellow().bold()
        } else {
            "No estimate".dimmed()
        };
        println!("  {label:<28} {:>5} issues", stats.no_estimation_count);
    }
    println!();
}

fn print_csv(stats: &AggregationResult) {
    println!("facet,label,value");
    for (facet, tallies) in [
        ("state", &stats.state),
        ("priority", &stats.priority),
        ("milestone", &stats.milestone),
        ("assignee", &stats.assignee),
    ] {
        for tally in tallies {
            println!("{facet},{},{}", crate::csv_escape(&tally.label), tally.value);
        }
    }
    for tally in &stats.team_workload {
        println!(
            "workload,{},{}",
            crate::csv_escape(&tally.label),
            format_estimate(tally.value)
        );
    }
    println!("no_estimation,,{}", stats.no_estimation_count);
    println!("stats_issue_count,,{}", stats.stats_issue_count);
    println!("total_issue_count,,{}", stats.total_issue_count);
}
