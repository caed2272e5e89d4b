//! Configuration management.
//!
//! Board Pulse keeps its state under `~/.board-pulse/`:
//! - **Config**: `config.json` with the API token, endpoint and page size
//! - **Database**: `data/pulse.db` with the issue cache, boards and filter
//!
//! `PULSE_HOME` relocates the whole directory (used by tests and for
//! running several dashboards side by side).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Directory name under the home directory.
pub const HOME_DIR_NAME: &str = ".board-pulse";

/// Characters of the token shown by `config show`.
const TOKEN_VISIBLE_CHARS: usize = 8;

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Where the effective token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// `--token` flag or `GITHUB_TOKEN`
    Argument,
    /// `PULSE_TOKEN`
    Environment,
    ConfigFile,
}

impl TokenSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Argument => "--token / GITHUB_TOKEN",
            Self::Environment => "PULSE_TOKEN",
            Self::ConfigFile => "config file",
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// The Board Pulse home directory.
///
/// `PULSE_HOME` if set, otherwise `~/.board-pulse`.
#[must_use]
pub fn pulse_home() -> Option<PathBuf> {
    if let Some(home) = non_empty_env("PULSE_HOME") {
        return Some(PathBuf::from(home));
    }
    directories::BaseDirs::new().map(|b| b.home_dir().join(HOME_DIR_NAME))
}

/// Path of `config.json`.
///
/// # Errors
///
/// Returns [`Error::Config`] if no home directory can be determined.
pub fn config_path() -> Result<PathBuf> {
    pulse_home()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (`--db` or `PULSE_DB`)
/// 2. `<home>/data/pulse.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    pulse_home().map(|dir| dir.join("data").join("pulse.db"))
}

/// Load the configuration, or defaults when the file does not exist.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<PulseConfig> {
    load_config_from(&config_path()?)
}

/// # Errors
///
/// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<PulseConfig> {
    if !path.exists() {
        return Ok(PulseConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save the configuration.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be written.
pub fn save_config(config: &PulseConfig) -> Result<()> {
    save_config_to(&config_path()?, config)
}

/// Write `config` to `path` atomically: temp file, then rename. The file
/// holds a credential, so it is created owner-readable only.
///
/// # Errors
///
/// Returns [`Error::Config`] if the directory or file cannot be written.
pub fn save_config_to(path: &Path, config: &PulseConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
    let temp_path = path.with_extension("json.tmp");

    let write = || -> std::io::Result<()> {
        {
            let mut opts = fs::OpenOptions::new();
            opts.write(true).create(true).truncate(true);
            #[cfg(unix)]
            opts.mode(0o600);
            let mut file = opts.open(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)
    };

    write().map_err(|e| Error::Config(format!("Failed to write config file: {e}")))
}

/// Resolve the API token.
///
/// Priority:
/// 1. `explicit` (`--token` flag or `GITHUB_TOKEN`, resolved by clap)
/// 2. `PULSE_TOKEN` environment variable
/// 3. `token` in `config.json`
///
/// # Errors
///
/// Returns [`Error::MissingToken`] when none is available.
pub fn resolve_token(explicit: Option<&str>, config: &PulseConfig) -> Result<(String, TokenSource)> {
    resolve_token_with(explicit, non_empty_env("PULSE_TOKEN"), config)
}

fn resolve_token_with(
    explicit: Option<&str>,
    env_token: Option<String>,
    config: &PulseConfig,
) -> Result<(String, TokenSource)> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok((token.to_string(), TokenSource::Argument));
    }
    if let Some(token) = env_token {
        return Ok((token.trim().to_string(), TokenSource::Environment));
    }
    config
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| (t.to_string(), TokenSource::ConfigFile))
        .ok_or(Error::MissingToken)
}

/// Resolve the GraphQL endpoint: `PULSE_GRAPHQL_ENDPOINT`, then the config
/// file. `None` means the client default.
#[must_use]
pub fn resolve_endpoint(config: &PulseConfig) -> Option<String> {
    non_empty_env("PULSE_GRAPHQL_ENDPOINT").or_else(|| config.endpoint.clone())
}

/// Show only the first few characters of a token.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(TOKEN_VISIBLE_CHARS).collect();
    if visible.len() == token.len() {
        visible
    } else {
        format!("{visible}...")
    }
}
