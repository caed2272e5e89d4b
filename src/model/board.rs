//! Board model for Board Pulse.
//!
//! A board is a GitHub Projects V2 project owned by a user or an
//! organization. Boards are discovered through the viewer query and one of
//! them is selected as the retrieval target.

use serde::{Deserialize, Serialize};

/// Who owns a board. Decides which GraphQL root field is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerType {
    User,
    Organization,
}

impl OwnerType {
    /// GraphQL root field for this owner kind.
    #[must_use]
    pub const fn query_field(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for OwnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Organization => write!(f, "organization"),
        }
    }
}

/// A reference to one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRef {
    /// Display title
    pub title: String,

    /// Project number, unique per owner
    pub number: u32,

    /// Owner login
    pub owner: String,

    pub owner_type: OwnerType,
}

impl BoardRef {
    /// `owner / title` label used in listings.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.owner, self.title)
    }

    /// Whether this reference points at `owner` + `number` (owner is case-insensitive).
    #[must_use]
    pub fn matches(&self, owner: &str, number: u32) -> bool {
        self.number == number && self.owner.eq_ignore_ascii_case(owner)
    }
}
