//! Filter command implementation.

use super::open_dashboard;
use super::stats::print_filter_line;
use crate::cli::FilterCommands;
use crate::error::Result;
use crate::pipeline::{Dashboard, FacetSelection, Filter, WorkloadSlice};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterOutput<'a> {
    filter: &'a Filter,
    active: bool,
    matching: usize,
    cached: usize,
}

/// Execute a filter command.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidArgument`] for an unknown facet, or a
/// storage error if the filter cannot be saved.
pub fn execute(command: &FilterCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut dashboard = open_dashboard(db_path)?;

    match command {
        FilterCommands::Set { facet, value } => {
            let selection = FacetSelection::parse(facet, value)?;
            dashboard.toggle(selection)?;
        }
        FilterCommands::Workload { team } => {
            dashboard.toggle_workload(WorkloadSlice::Team(team.clone()))?;
        }
        FilterCommands::NoEstimation => {
            dashboard.toggle_workload(WorkloadSlice::NoEstimation)?;
        }
        FilterCommands::Clear => dashboard.clear_filter()?,
        FilterCommands::Show => {}
    }

    print_filter(&dashboard, json)
}

fn print_filter(dashboard: &Dashboard, json: bool) -> Result<()> {
    let filter = dashboard.filter();
    let matching = dashboard.filtered().len();
    let cached = dashboard.issues().len();

    if json {
        let output = FilterOutput {
            filter,
            active: filter.is_active(),
            matching,
            cached,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_csv() {
        println!("facet,value");
        for (facet, value) in filter.describe() {
            println!("{facet},{}", crate::csv_escape(&value));
        }
    } else {
        print_filter_line(filter);
        println!("{matching} of {cached} cached issues match.");
    }
    Ok(())
}
