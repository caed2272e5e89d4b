//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// Board Pulse - issue statistics for GitHub Projects boards
#[derive(Parser, Debug)]
#[command(name = "pulse", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.board-pulse/data/pulse.db)
    #[arg(long, global = true, env = "PULSE_DB")]
    pub db: Option<PathBuf>,

    /// GitHub token (overrides PULSE_TOKEN and the config file)
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover and select boards
    Boards {
        #[command(subcommand)]
        command: BoardsCommands,
    },

    /// Fetch all open issues of the selected board
    Fetch {
        /// Do not draw the progress line
        #[arg(long)]
        no_progress: bool,
    },

    /// Show statistics for the filtered issues
    Stats {
        /// Page of the assignee breakdown (10 per page)
        #[arg(long, default_value_t = 1)]
        assignee_page: usize,
    },

    /// List the filtered issues with their children
    Issues {
        /// Hide child issues
        #[arg(long)]
        collapsed: bool,
    },

    /// Change the active filter
    Filter {
        #[command(subcommand)]
        command: FilterCommands,
    },

    /// Show cache, board and filter status
    Status,

    /// Manage the API token
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Board Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum BoardsCommands {
    /// Refresh the list of boards visible to the token
    Sync,

    /// List known boards
    List,

    /// Select the board to fetch
    Select {
        /// Board owner login (user or organization)
        owner: String,

        /// Board number
        number: u32,
    },
}

// ============================================================================
// Filter Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum FilterCommands {
    /// Toggle a facet value (selecting the active value clears it)
    Set {
        /// Facet: state, priority, milestone, assignee, team, estimation
        facet: String,

        /// Value to select (`Unassigned` selects issues without assignees)
        value: String,
    },

    /// Toggle a team's estimated work
    Workload {
        /// Team name
        team: String,
    },

    /// Toggle issues without an estimate
    NoEstimation,

    /// Clear every facet
    Clear,

    /// Show the active filter
    Show,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Store a token in the config file
    SetToken {
        /// GitHub token with `read:project` scope
        token: String,
    },

    /// Remove the stored token
    ClearToken,

    /// Show the effective configuration
    Show,
}
