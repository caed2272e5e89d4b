//! Ingestion and aggregation pipeline.
//!
//! ```text
//! FetchOrchestrator ──▶ normalize ──▶ hierarchy ──▶ Filter ──▶ stats / view
//!   (pages, progress,     (raw item →   (child_ids,   (six AND    (counts,
//!    cancellation)         Issue)        placement)    facets)     workload, tree)
//! ```
//!
//! Everything after retrieval is a pure function over issue slices; the
//! [`Dashboard`] session owns the cached issues and the active filter.

pub mod fetch;
pub mod filter;
pub mod hierarchy;
pub mod normalize;
pub mod session;
pub mod stats;
pub mod view;

pub use fetch::{FetchOrchestrator, FetchOutcome, FetchState, Progress};
pub use filter::{AssigneeFilter, FacetSelection, Filter, WorkloadSlice};
pub use hierarchy::{Hierarchy, Partition, Placement, link_children, partition};
pub use normalize::{FieldValue, KnownField, Rejection, normalize, normalize_all};
pub use session::{Dashboard, RefreshSummary};
pub use stats::{ASSIGNEE_PAGE_SIZE, AggregationResult, AssigneePage, Tally, aggregate};
pub use view::{IssueNode, IssueView, PriorityTone, build_view, estimation_mismatch};
