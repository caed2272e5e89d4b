//! Dashboard session.
//!
//! Holds the cached issue set and the active filter on top of the store.
//! Only a completed retrieval replaces the cache; a failed or cancelled
//! one leaves cache and filter as they were.

use super::fetch::{FetchOrchestrator, FetchOutcome, Progress};
use super::filter::{FacetSelection, Filter, WorkloadSlice};
use super::stats::{AggregationResult, aggregate};
use crate::error::{Error, Result};
use crate::github::ItemSource;
use crate::model::{BoardRef, Issue};
use crate::storage::{CacheSnapshot, SqliteStorage, content_hash, has_changed};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Summary of a committed retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub board: BoardRef,
    pub board_title: String,
    pub issue_count: usize,
    pub fetched: usize,
    pub closed: usize,
    pub malformed: usize,
    /// Issue set differs from the previous cache
    pub changed: bool,
    pub fetched_at: DateTime<Utc>,
}

/// Session state shared by all dashboard operations.
#[derive(Debug)]
pub struct Dashboard {
    storage: SqliteStorage,
    issues: Vec<Issue>,
    filter: Filter,
}

impl Dashboard {
    /// Restore the session from `storage`.
    ///
    /// An unreadable cache is logged and starts the session empty.
    #[must_use]
    pub fn load(storage: SqliteStorage) -> Self {
        let issues = storage.cached_issues().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read cached issues");
            Vec::new()
        });
        let filter = storage.filter().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read saved filter");
            Filter::default()
        });
        Self {
            storage,
            issues,
            filter,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The board retrievals run against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoBoardSelected`] when none has been chosen.
    pub fn selected_board(&self) -> Result<BoardRef> {
        self.storage.selected_board()?.ok_or(Error::NoBoardSelected)
    }

    /// Retrieve `board` and commit the result.
    ///
    /// # Errors
    ///
    /// Propagates retrieval errors (including cancellation) without touching
    /// the cache, and storage errors from the commit.
    pub async fn refresh<S, F>(
        &mut self,
        orchestrator: &FetchOrchestrator,
        source: &S,
        board: &BoardRef,
        progress: F,
    ) -> Result<RefreshSummary>
    where
        S: ItemSource,
        F: FnMut(Progress),
    {
        let outcome = orchestrator.run(source, board, progress).await?;
        self.commit(board, outcome)
    }

    /// Replace the cache with a completed retrieval and reset the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted; the in-memory
    /// session is left unchanged in that case.
    pub fn commit(&mut self, board: &BoardRef, outcome: FetchOutcome) -> Result<RefreshSummary> {
        let hash = content_hash(&outcome.issues)?;
        let previous = self.storage.issues_hash()?;
        let changed = has_changed(&hash, previous.as_deref());
        let fetched_at = Utc::now();

        self.storage.save_snapshot(&CacheSnapshot {
            board,
            issues: &outcome.issues,
            hash: &hash,
            fetched_at,
        })?;

        info!(
            board = %board.label(),
            issues = outcome.issues.len(),
            changed,
            "Issue cache updated"
        );

        let summary = RefreshSummary {
            board: board.clone(),
            board_title: outcome.board_title,
            issue_count: outcome.issues.len(),
            fetched: outcome.fetched,
            closed: outcome.closed,
            malformed: outcome.malformed,
            changed,
            fetched_at,
        };
        self.issues = outcome.issues;
        self.filter.clear();
        Ok(summary)
    }

    /// Toggle one facet and persist the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be saved.
    pub fn toggle(&mut self, selection: FacetSelection) -> Result<()> {
        let mut next = self.filter.clone();
        next.toggle(selection);
        self.set_filter(next)
    }

    /// Toggle a workload slice and persist the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be saved.
    pub fn toggle_workload(&mut self, slice: WorkloadSlice) -> Result<()> {
        let mut next = self.filter.clone();
        next.toggle_workload(slice);
        self.set_filter(next)
    }

    /// # Errors
    ///
    /// Returns an error if the filter cannot be saved.
    pub fn clear_filter(&mut self) -> Result<()> {
        self.set_filter(Filter::default())
    }

    fn set_filter(&mut self, filter: Filter) -> Result<()> {
        self.storage.save_filter(&filter)?;
        self.filter = filter;
        Ok(())
    }

    /// Cached issues passing the active filter, in cache order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Issue> {
        self.filter.apply(&self.issues)
    }

    /// Aggregation over the filtered issues.
    #[must_use]
    pub fn stats(&self) -> AggregationResult {
        aggregate(&self.filtered())
    }
}
