//! Config command implementation.

use crate::cli::ConfigCommands;
use crate::config::{
    config_path, load_config, mask_token, resolve_db_path, resolve_endpoint, resolve_token,
    save_config,
};
use crate::error::Result;
use crate::github::DEFAULT_ENDPOINT;
use crate::github::queries::MAX_PAGE_SIZE;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOutput {
    config_path: String,
    db_path: Option<String>,
    token: Option<String>,
    token_source: Option<&'static str>,
    endpoint: String,
    page_size: u32,
}

/// Execute a config command.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if the config file cannot be read or
/// written.
pub fn execute(
    command: &ConfigCommands,
    db_path: Option<&PathBuf>,
    token: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        ConfigCommands::SetToken { token } => set_token(token, json),
        ConfigCommands::ClearToken => clear_token(json),
        ConfigCommands::Show => show(db_path, token, json),
    }
}

fn set_token(token: &str, json: bool) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(crate::Error::InvalidArgument("Token must not be empty".into()));
    }

    let mut config = load_config()?;
    config.token = Some(token.to_string());
    save_config(&config)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "saved": true, "token": mask_token(token) })
        );
    } else {
        println!("Token {} saved to {}", mask_token(token), config_path()?.display());
    }
    Ok(())
}

fn clear_token(json: bool) -> Result<()> {
    let mut config = load_config()?;
    let removed = config.token.take().is_some();
    if removed {
        save_config(&config)?;
    }

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if removed {
        println!("Token removed.");
    } else {
        println!("No stored token.");
    }
    Ok(())
}

fn show(db_path: Option<&PathBuf>, token: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let resolved = resolve_token(token, &config).ok();

    let output = ConfigOutput {
        config_path: config_path()?.display().to_string(),
        db_path: resolve_db_path(db_path.map(PathBuf::as_path)).map(|p| p.display().to_string()),
        token: resolved.as_ref().map(|(t, _)| mask_token(t)),
        token_source: resolved.as_ref().map(|(_, s)| s.as_str()),
        endpoint: resolve_endpoint(&config).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        page_size: config.page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Config:    {}", output.config_path);
    if let Some(db) = &output.db_path {
        println!("Database:  {db}");
    }
    match (&output.token, output.token_source) {
        (Some(token), Some(source)) => println!("Token:     {token} {}", format!("({source})").dimmed()),
        _ => println!("Token:     {}", "not set".red()),
    }
    println!("Endpoint:  {}", output.endpoint);
    println!("Page size: {}", output.page_size);
    Ok(())
}
