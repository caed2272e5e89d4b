//! Command implementations.

pub mod boards;
pub mod completions;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod issues;
pub mod stats;
pub mod status;
pub mod version;

use crate::config::{load_config, resolve_db_path, resolve_endpoint, resolve_token};
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::pipeline::Dashboard;
use crate::storage::SqliteStorage;
use std::path::{Path, PathBuf};

/// Open the database, creating it and its directory on first use.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine database location".into()))?;
    ensure_parent(&path)?;
    SqliteStorage::open(&path)
}

pub(crate) fn open_dashboard(db_path: Option<&PathBuf>) -> Result<Dashboard> {
    Ok(Dashboard::load(open_storage(db_path)?))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Build a GitHub client from the effective configuration.
pub(crate) fn github_client(token: Option<&str>) -> Result<GitHubClient> {
    let config = load_config()?;
    let (token, source) = resolve_token(token, &config)?;
    tracing::debug!(source = source.as_str(), "Using GitHub token");
    GitHubClient::new(token, resolve_endpoint(&config), config.page_size)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Format an estimation without trailing zeros.
pub(crate) fn format_estimate(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_estimate() {
        assert_eq!(format_estimate(5.0), "5");
        assert_eq!(format_estimate(2.5), "2.5");
        assert_eq!(format_estimate(1.0 / 3.0), "0.33");
        assert_eq!(format_estimate(0.0), "0");
        assert_eq!(format_estimate(10.0), "10");
    }
}
