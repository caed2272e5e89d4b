//! GitHub Projects retrieval.
//!
//! Board items are fetched from the GitHub GraphQL API:
//!
//! ```text
//! ┌──────────────────┐
//! │ Fetch orchestrator│
//! └────────┬─────────┘
//!          │ ItemSource::fetch_page(board, cursor)
//!          ▼
//! ┌─────────────────┐
//! │  GitHubClient   │  ← bearer token, cursor-chained pages of 100
//! └────────┬────────┘
//!          ▼
//!   HTTPS  api.github.com/graphql
//! ```
//!
//! Only the response *shape* matters to the rest of the crate; everything
//! downstream consumes [`RawItem`] values.

pub mod client;
pub mod queries;
pub mod source;
pub mod types;

pub use client::{DEFAULT_ENDPOINT, GitHubClient};
pub use source::{ItemPage, ItemSource};
pub use types::{RawContent, RawFieldValue, RawItem};
