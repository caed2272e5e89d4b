//! Data models for Board Pulse.
//!
//! This module contains the domain models:
//! - Issue (canonical work item after normalization)
//! - BoardRef (a GitHub Project board the token can see)

pub mod board;
pub mod issue;

pub use board::{BoardRef, OwnerType};
pub use issue::{Issue, UNASSIGNED, UNKNOWN_STATE, UNSET};
