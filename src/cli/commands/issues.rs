//! Issues command implementation.
//!
//! Prints the filtered issues as a forest: roots ordered by function type,
//! children indented below their parent. Parents whose estimation does not
//! add up are highlighted.

use super::stats::print_filter_line;
use super::{format_estimate, open_dashboard};
use crate::error::Result;
use crate::model::{Issue, UNASSIGNED};
use crate::pipeline::{IssueNode, IssueView, Partition, PriorityTone, build_view, partition};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;

/// Longest title printed before truncation.
const MAX_TITLE: usize = 60;

/// Execute the issues command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or output fails.
pub fn execute(db_path: Option<&PathBuf>, collapsed: bool, json: bool) -> Result<()> {
    let dashboard = open_dashboard(db_path)?;
    let filtered = dashboard.filtered();
    let view = build_view(&filtered);

    if json {
        println!("{}", serde_json::to_string(&view)?);
        return Ok(());
    }

    if crate::is_csv() {
        println!(
            "id,reference,title,state,priority,milestone,assignees,estimation,team,function_type,parent_id,depth,mismatch,url"
        );
        for root in &view.roots {
            print_csv_node(root, 0);
        }
        return Ok(());
    }

    if filtered.is_empty() {
        println!("No issues.");
        if dashboard.issues().is_empty() {
            println!("Run `pulse fetch` to load the selected board.");
        }
        return Ok(());
    }

    print_filter_line(dashboard.filter());
    print_header(&view, &partition(&filtered));
    println!();
    for root in &view.roots {
        print_node(root, 0, collapsed);
    }
    Ok(())
}

fn print_header(view: &IssueView<'_>, parts: &Partition<'_>) {
    let mut summary = format!("{} issues", view.issue_count);
    if !parts.nested.is_empty() || !parts.orphans.is_empty() {
        summary.push_str(&format!(
            " ({} top-level, {} children, {} with parent not shown)",
            parts.top_level.len(),
            parts.nested.len(),
            parts.orphans.len()
        ));
    }
    println!(
        "{summary} | estimation total {}",
        format_estimate(view.total_estimation).bold()
    );
    let mismatches = view.mismatch_count();
    if mismatches > 0 {
        println!(
            "{}",
            format!("{mismatches} parent(s) with estimation not matching their children").red()
        );
    }
}

fn print_node(node: &IssueNode<'_>, depth: usize, collapsed: bool) {
    let issue = node.issue;
    let indent = "    ".repeat(depth);
    let marker = if depth > 0 {
        "↳ ".dimmed()
    } else if node.children.is_empty() {
        "  ".normal()
    } else if collapsed {
        "▶ ".normal()
    } else {
        "▼ ".normal()
    };

    let title = truncate(&issue.title, MAX_TITLE);
    let title = if node.mismatch {
        format!("{title} ≠").red().bold()
    } else {
        title.normal()
    };

    let function = if issue.function_type.is_empty() {
        String::new()
    } else {
        format!("[{}] ", issue.function_type)
    };

    println!(
        "{indent}{marker}{}{} {}{}",
        function.cyan(),
        issue.reference().dimmed(),
        title,
        if node.orphan { " (parent not shown)".dimmed() } else { "".normal() }
    );
    println!(
        "{indent}    {} | {} | est {} | {} | {} | {} | {}",
        issue.state_label(),
        assignees(issue),
        issue.estimation.map_or_else(|| "-".to_string(), format_estimate),
        issue.team_label(),
        priority(issue),
        issue.milestone_label(),
        issue
            .updated_at
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
            .dimmed()
    );

    if !collapsed {
        for child in &node.children {
            print_node(child, depth + 1, collapsed);
        }
    }
}

fn assignees(issue: &Issue) -> String {
    if issue.assignees.is_empty() {
        UNASSIGNED.to_string()
    } else {
        issue.assignees.join(", ")
    }
}

fn priority(issue: &Issue) -> ColoredString {
    let label = issue.priority_label();
    match PriorityTone::of(label) {
        PriorityTone::High => label.red(),
        PriorityTone::Medium => label.yellow(),
        PriorityTone::Low => label.green(),
        PriorityTone::None => label.dimmed(),
    }
}

fn print_csv_node(node: &IssueNode<'_>, depth: usize) {
    let issue = node.issue;
    println!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        issue.id,
        issue.reference(),
        crate::csv_escape(&issue.title),
        crate::csv_escape(issue.state_label()),
        crate::csv_escape(issue.priority_label()),
        crate::csv_escape(issue.milestone_label()),
        crate::csv_escape(&issue.assignees.join(";")),
        issue.estimation.map(format_estimate).unwrap_or_default(),
        crate::csv_escape(issue.team_label()),
        crate::csv_escape(&issue.function_type),
        issue.parent_id.as_deref().unwrap_or_default(),
        depth,
        node.mismatch,
        issue.url
    );
    for child in &node.children {
        print_csv_node(child, depth + 1);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
