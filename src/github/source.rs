//! Item source trait.
//!
//! Defines the page-retrieval interface the fetch orchestrator drives.
//! [`super::GitHubClient`] is the production implementation; tests plug in
//! in-memory sources.

use super::types::RawItem;
use crate::error::Result;
use crate::model::BoardRef;

/// One page of raw items plus the continuation state.
#[derive(Debug, Clone)]
pub struct ItemPage {
    /// Board display title as reported by the API
    pub board_title: String,
    /// Total number of items on the board
    pub total_count: u64,
    pub items: Vec<RawItem>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Trait for paginated item retrieval.
pub trait ItemSource: Send + Sync {
    /// Fetch the page that starts after `cursor` (`None` for the first page).
    fn fetch_page(
        &self,
        board: &BoardRef,
        cursor: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ItemPage>> + Send;
}
