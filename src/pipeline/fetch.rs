//! Paginated retrieval with progress and cancellation.
//!
//! At most one retrieval is active per orchestrator: starting a run cancels
//! the previous one. Pages are fetched strictly in sequence, each request
//! racing the run's [`CancellationToken`]. Nothing is returned unless the
//! whole pass succeeds.
//!
//! Progress: first page 0-15%, remaining pages 15-85%, processing
//! 85-100%.

use super::hierarchy::link_children;
use super::normalize::normalize_all;
use crate::error::{Error, Result};
use crate::github::{ItemPage, ItemSource, RawItem};
use crate::model::{BoardRef, Issue};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const FIRST_PAGE_DONE: f64 = 15.0;
const PAGES_DONE: f64 = 85.0;
const COMPLETE: f64 = 100.0;

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    FetchingFirstPage,
    FetchingRemainingPages,
    Processing,
    Complete,
    Cancelled,
    Failed,
}

impl FetchState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingFirstPage => "fetching_first_page",
            Self::FetchingRemainingPages => "fetching_remaining_pages",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// A progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// 0-100
    pub percent: f64,
    pub status: Option<String>,
    pub detail: Option<String>,
}

impl Progress {
    fn new(percent: f64, status: impl Into<String>) -> Self {
        Self {
            percent,
            status: Some(status.into()),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub board_title: String,
    /// Open issues in page-arrival order, children linked
    pub issues: Vec<Issue>,
    /// Item count the board reported on the first page
    pub total_count: u64,
    /// Raw items received across all pages
    pub fetched: usize,
    pub closed: usize,
    pub malformed: usize,
}

/// Drives one retrieval pass at a time.
pub struct FetchOrchestrator {
    active: Mutex<Option<(u64, CancellationToken)>>,
    state: Mutex<FetchState>,
    generation: AtomicU64,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            state: Mutex::new(FetchState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// True while a run holds the active slot.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// Cancel the active run, if any.
    pub fn cancel(&self) {
        let active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some((generation, token)) = active.as_ref() {
            debug!(generation, "Cancelling retrieval");
            token.cancel();
        }
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let mut active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some((previous, old)) = active.replace((generation, token.clone())) {
            debug!(previous, generation, "Pre-empting running retrieval");
            old.cancel();
        }
        drop(active);

        self.transition(generation, FetchState::FetchingFirstPage);
        (generation, token)
    }

    fn finish(&self, generation: u64, state: FetchState) {
        self.transition(generation, state);
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if active.as_ref().is_some_and(|(g, _)| *g == generation) {
            *active = None;
        }
    }

    /// Set the state unless a newer run has taken over.
    fn transition(&self, generation: u64, state: FetchState) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Run one full retrieval pass for `board`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when cancelled or pre-empted, the first
    /// transport or protocol error otherwise. Partial results are discarded.
    pub async fn run<S, F>(&self, source: &S, board: &BoardRef, mut progress: F) -> Result<FetchOutcome>
    where
        S: ItemSource,
        F: FnMut(Progress),
    {
        let (generation, token) = self.begin();
        let result = self
            .drive(source, board, generation, &token, &mut progress)
            .await;

        match &result {
            Ok(outcome) => {
                info!(
                    board = %board.label(),
                    issues = outcome.issues.len(),
                    fetched = outcome.fetched,
                    "Retrieval complete"
                );
                self.transition(generation, FetchState::Complete);
                self.finish(generation, FetchState::Idle);
            }
            Err(Error::Cancelled) => {
                debug!(generation, "Retrieval cancelled");
                self.finish(generation, FetchState::Cancelled);
            }
            Err(e) => {
                debug!(generation, error = %e, "Retrieval failed");
                self.finish(generation, FetchState::Failed);
            }
        }

        result
    }

    async fn drive<S, F>(
        &self,
        source: &S,
        board: &BoardRef,
        generation: u64,
        token: &CancellationToken,
        progress: &mut F,
    ) -> Result<FetchOutcome>
    where
        S: ItemSource,
        F: FnMut(Progress),
    {
        progress(Progress::new(0.0, format!("Fetching {}", board.label())));

        let first = fetch_page(source, board, None, token).await?;
        let total_count = first.total_count;
        let board_title = first.board_title.clone();
        let mut cursor = continuation(&first)?;
        let mut items: Vec<RawItem> = first.items;

        progress(
            Progress::new(FIRST_PAGE_DONE, format!("{total_count} items on board"))
                .with_detail(format!("Fetched {} of {total_count}", items.len())),
        );

        if cursor.is_some() {
            self.transition(generation, FetchState::FetchingRemainingPages);
        }

        while let Some(after) = cursor {
            let page = fetch_page(source, board, Some(&after), token).await?;
            cursor = continuation(&page)?;
            let repeated = cursor.as_deref() == Some(after.as_str());
            if cursor.is_some() && (repeated || page.items.is_empty()) {
                return Err(Error::Protocol(format!(
                    "Pagination stalled after cursor '{after}'"
                )));
            }
            items.extend(page.items);

            progress(
                Progress::new(
                    page_percent(items.len(), total_count),
                    "Fetching remaining pages",
                )
                .with_detail(format!("Fetched {} of {total_count}", items.len())),
            );
        }

        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.transition(generation, FetchState::Processing);
        progress(Progress::new(PAGES_DONE, "Processing issues"));

        let fetched = items.len();
        let normalized = normalize_all(&items, &board_title);
        let mut issues = normalized.issues;
        link_children(&mut issues)?;

        progress(
            Progress::new(COMPLETE, "Complete")
                .with_detail(format!("{} open issues", issues.len())),
        );

        Ok(FetchOutcome {
            board_title,
            issues,
            total_count,
            fetched,
            closed: normalized.closed,
            malformed: normalized.malformed,
        })
    }
}

async fn fetch_page<S: ItemSource>(
    source: &S,
    board: &BoardRef,
    cursor: Option<&str>,
    token: &CancellationToken,
) -> Result<ItemPage> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Error::Cancelled),
        page = source.fetch_page(board, cursor) => page,
    }
}

/// Cursor for the next page.
fn continuation(page: &ItemPage) -> Result<Option<String>> {
    match (page.has_next_page, page.end_cursor.as_deref()) {
        (false, _) => Ok(None),
        (true, Some(cursor)) if !cursor.is_empty() => Ok(Some(cursor.to_string())),
        (true, _) => Err(Error::Protocol(
            "Page reports more items but no end cursor".to_string(),
        )),
    }
}

#[allow(clippy::cast_precision_loss)]
fn page_percent(fetched: usize, total: u64) -> f64 {
    if total == 0 {
        return PAGES_DONE;
    }
    let ratio = (fetched as f64 / total as f64).min(1.0);
    FIRST_PAGE_DONE + (PAGES_DONE - FIRST_PAGE_DONE) * ratio
}
