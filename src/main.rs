//! Board Pulse CLI entry point.

use clap::Parser;
use pulse::cli::commands;
use pulse::cli::{Cli, Commands, OutputFormat};
use pulse::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.format == OutputFormat::Csv {
        pulse::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || (cli.format != OutputFormat::Csv
            && !std::io::IsTerminal::is_terminal(&std::io::stdout()));

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let token = cli.token.as_deref();

    match &cli.command {
        Commands::Boards { command } => commands::boards::execute(command, db, token, json),
        Commands::Fetch { no_progress } => {
            commands::fetch::execute(db, token, *no_progress, cli.quiet, json)
        }
        Commands::Stats { assignee_page } => commands::stats::execute(db, *assignee_page, json),
        Commands::Issues { collapsed } => commands::issues::execute(db, *collapsed, json),
        Commands::Filter { command } => commands::filter::execute(command, db, json),
        Commands::Status => commands::status::execute(db, token, json),
        Commands::Config { command } => commands::config::execute(command, db, token, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(json),
    }
}
