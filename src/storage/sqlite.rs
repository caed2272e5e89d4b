//! SQLite storage implementation.
//!
//! Values are JSON documents in the `kv` table. Reads of a document that no
//! longer parses are logged and treated as absent, so a stale or corrupt
//! cache never blocks the dashboard.

use crate::error::Result;
use crate::model::{BoardRef, Issue};
use crate::pipeline::Filter;
use crate::storage::schema::apply_schema;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Stored document keys.
pub mod keys {
    pub const ISSUES: &str = "issues";
    pub const ISSUES_HASH: &str = "issues_hash";
    pub const LAST_FETCH: &str = "last_fetch";
    pub const CACHED_BOARD: &str = "cached_board";
    pub const BOARDS: &str = "boards";
    pub const SELECTED_BOARD: &str = "selected_board";
    pub const FILTER: &str = "filter";
}

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Everything written after a successful retrieval pass.
#[derive(Debug)]
pub struct CacheSnapshot<'a> {
    pub board: &'a BoardRef,
    pub issues: &'a [Issue],
    pub hash: &'a str,
    pub fetched_at: DateTime<Utc>,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5000)))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    // ==================
    // Raw documents
    // ==================

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        upsert(&self.conn, key, value, Utc::now().timestamp_millis())
    }

    /// When a document was last written.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let millis: Option<i64> = self
            .conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    /// Read and parse a JSON document. Unparseable documents read as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_value(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable stored value");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set_value(key, &json)
    }

    // ==================
    // Issue cache
    // ==================

    /// The last successfully fetched issue set; empty when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn cached_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.get_json(keys::ISSUES)?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn cached_board(&self) -> Result<Option<BoardRef>> {
        self.get_json(keys::CACHED_BOARD)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn issues_hash(&self) -> Result<Option<String>> {
        self.get_value(keys::ISSUES_HASH)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_fetch(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.get_value(keys::LAST_FETCH)?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc)))
    }

    /// Replace the cached issue set, its hash and the fetch time in one
    /// transaction. The persisted filter is reset.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any write fails. Nothing is
    /// written in that case.
    pub fn save_snapshot(&mut self, snapshot: &CacheSnapshot<'_>) -> Result<()> {
        let issues = serde_json::to_string(snapshot.issues)?;
        let board = serde_json::to_string(snapshot.board)?;
        let filter = serde_json::to_string(&Filter::default())?;
        let now = snapshot.fetched_at.timestamp_millis();

        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        upsert(&tx, keys::ISSUES, &issues, now)?;
        upsert(&tx, keys::ISSUES_HASH, snapshot.hash, now)?;
        upsert(&tx, keys::LAST_FETCH, &snapshot.fetched_at.to_rfc3339(), now)?;
        upsert(&tx, keys::CACHED_BOARD, &board, now)?;
        upsert(&tx, keys::FILTER, &filter, now)?;
        tx.commit()?;

        Ok(())
    }

    // ==================
    // Boards
    // ==================

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn boards(&self) -> Result<Vec<BoardRef>> {
        Ok(self.get_json(keys::BOARDS)?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_boards(&mut self, boards: &[BoardRef]) -> Result<()> {
        self.set_json(keys::BOARDS, boards)
    }

    /// When the board list was last synced.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn boards_synced_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.updated_at(keys::BOARDS)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn selected_board(&self) -> Result<Option<BoardRef>> {
        self.get_json(keys::SELECTED_BOARD)
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn select_board(&mut self, board: &BoardRef) -> Result<()> {
        self.set_json(keys::SELECTED_BOARD, board)
    }

    // ==================
    // Filter
    // ==================

    /// The persisted filter; all-unset when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn filter(&self) -> Result<Filter> {
        Ok(self.get_json(keys::FILTER)?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_filter(&mut self, filter: &Filter) -> Result<()> {
        self.set_json(keys::FILTER, filter)
    }
}

fn upsert(conn: &Connection, key: &str, value: &str, now: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, value, now],
    )?;
    Ok(())
}
