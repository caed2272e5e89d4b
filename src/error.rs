//! Error types for Board Pulse.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 5=protocol, 6=transport, etc.)
//! - Retryability flags (a retry is always a fresh user-initiated fetch)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

/// Result type alias for Board Pulse operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    StorageError,

    // Not Found (exit 3)
    BoardNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Protocol (exit 5)
    ProtocolError,
    PermissionDenied,

    // Transport (exit 6)
    TransportError,

    // Configuration (exit 7)
    MissingToken,
    NoBoardSelected,
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Cancellation (exit 9)
    Cancelled,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StorageError => "STORAGE_ERROR",
            Self::BoardNotFound => "BOARD_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::NoBoardSelected => "NO_BOARD_SELECTED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::StorageError => 2,
            Self::BoardNotFound => 3,
            Self::InvalidArgument => 4,
            Self::ProtocolError | Self::PermissionDenied => 5,
            Self::TransportError => 6,
            Self::MissingToken | Self::NoBoardSelected | Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::Cancelled => 9,
        }
    }

    /// Whether re-running the same command may succeed.
    ///
    /// Transport failures and cancellations are transient; everything else
    /// needs a change of input or configuration first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportError | Self::Cancelled)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Board Pulse operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No GitHub token configured")]
    MissingToken,

    #[error("No board selected")]
    NoBoardSelected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("GitHub API error: {0}")]
    Protocol(String),

    #[error("Board not found: {owner} #{number}")]
    BoardNotFound { owner: String, number: u32 },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Retrieval cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingToken => ErrorCode::MissingToken,
            Self::NoBoardSelected => ErrorCode::NoBoardSelected,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::Protocol(_) => ErrorCode::ProtocolError,
            Self::BoardNotFound { .. } => ErrorCode::BoardNotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True for errors raised before any request is sent.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::NoBoardSelected | Self::Config(_)
        )
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingToken => Some(
                "Set a token with `pulse config set-token <token>` \
                 or export GITHUB_TOKEN. The token needs `read:project` and `repo` scopes."
                    .to_string(),
            ),

            Self::NoBoardSelected => Some(
                "Discover boards:  pulse boards sync\n  \
                 Pick one:         pulse boards select <owner> <number>"
                    .to_string(),
            ),

            Self::BoardNotFound { owner, number } => Some(format!(
                "No board #{number} visible under '{owner}'. \
                 Run `pulse boards sync` to refresh the board list and check token permissions."
            )),

            Self::PermissionDenied(_) => Some(
                "Check that the token is valid and has the `read:project` scope.".to_string(),
            ),

            Self::Transport(_) => {
                Some("Check your network connection, then run `pulse fetch` again.".to_string())
            }

            Self::Cancelled => Some(
                "Previously cached issues were kept. Run `pulse fetch` to retry.".to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("facet") {
                    Some(
                        "Valid facets: state, priority, milestone, assignee, team, estimation"
                            .to_string(),
                    )
                } else {
                    None
                }
            }

            Self::Config(_)
            | Self::Protocol(_)
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
