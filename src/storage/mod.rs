//! SQLite storage layer for Board Pulse.
//!
//! Persists the dashboard's documents (issue cache, board list, selection,
//! filter) as JSON in a key/value table.
//!
//! # Submodules
//!
//! - [`hash`] - Content fingerprints of the cached issue set
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod hash;
pub mod schema;
pub mod sqlite;

pub use hash::{content_hash, has_changed};
pub use sqlite::{CacheSnapshot, SqliteStorage, keys};
