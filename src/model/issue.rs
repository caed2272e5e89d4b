//! Issue model for Board Pulse.
//!
//! An `Issue` is the canonical record produced by the normalizer from one
//! project item. Only open items are ever materialized, so there is no
//! lifecycle state on the record; `state` is the board's own status column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when the board has no status value for an item.
pub const UNKNOWN_STATE: &str = "Unknown";

/// Label used for an unset priority, milestone or team.
pub const UNSET: &str = "Unset";

/// Label used for items without assignees.
pub const UNASSIGNED: &str = "Unassigned";

/// A normalized work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// GraphQL node id, unique within one retrieval pass
    pub id: String,

    /// Repository owner login
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Issue number (display only, not unique across repositories)
    pub number: u64,

    pub title: String,

    pub url: String,

    /// Board status column (e.g. "In Progress")
    pub state: String,

    pub milestone: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub labels: Vec<String>,

    pub priority: String,

    /// Free-form grouping column used to order the issue list
    #[serde(default)]
    pub function_type: String,

    #[serde(default)]
    pub assignees: Vec<String>,

    /// Size estimate; `None` and `Some(0.0)` both mean "no estimate"
    pub estimation: Option<f64>,

    pub team: String,

    /// Display title of the board this issue was fetched from
    #[serde(default)]
    pub board: String,

    /// Node id of the parent issue, which may live outside the working set
    pub parent_id: Option<String>,

    /// Derived by the hierarchy builder, never read from the source
    #[serde(default)]
    pub child_ids: Vec<String>,
}

impl Issue {
    /// Create an issue with every optional facet at its sentinel value.
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            repo: repo.into(),
            number,
            title: title.into(),
            url: url.into(),
            state: UNKNOWN_STATE.to_string(),
            milestone: None,
            updated_at: None,
            labels: Vec::new(),
            priority: UNSET.to_string(),
            function_type: String::new(),
            assignees: Vec::new(),
            estimation: None,
            team: UNSET.to_string(),
            board: String::new(),
            parent_id: None,
            child_ids: Vec::new(),
        }
    }

    /// `owner/repo#number` reference.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number)
    }

    /// Estimation counted as workload: present and strictly positive.
    #[must_use]
    pub fn workload(&self) -> Option<f64> {
        self.estimation.filter(|e| *e > 0.0)
    }

    #[must_use]
    pub fn has_estimation(&self) -> bool {
        self.workload().is_some()
    }

    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.assignees.is_empty()
    }

    #[must_use]
    pub fn state_label(&self) -> &str {
        non_empty_or(&self.state, UNKNOWN_STATE)
    }

    #[must_use]
    pub fn priority_label(&self) -> &str {
        non_empty_or(&self.priority, UNSET)
    }

    #[must_use]
    pub fn milestone_label(&self) -> &str {
        self.milestone
            .as_deref()
            .map_or(UNSET, |m| non_empty_or(m, UNSET))
    }

    #[must_use]
    pub fn team_label(&self) -> &str {
        non_empty_or(&self.team, UNSET)
    }

    /// Record a child id. Returns `false` if it was already present.
    pub fn add_child(&mut self, child_id: &str) -> bool {
        if self.child_ids.iter().any(|c| c == child_id) {
            return false;
        }
        self.child_ids.push(child_id.to_string());
        true
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> Issue {
        Issue::new("I_1", "acme", "api", 7, "Fix login", "https://github.com/acme/api/issues/7")
    }

    #[test]
    fn test_new_uses_sentinels() {
        let issue = issue();
        assert_eq!(issue.state, UNKNOWN_STATE);
        assert_eq!(issue.priority, UNSET);
        assert_eq!(issue.team, UNSET);
        assert_eq!(issue.milestone_label(), UNSET);
        assert!(issue.is_unassigned());
        assert_eq!(issue.reference(), "acme/api#7");
    }

    #[test]
    fn test_zero_estimation_is_not_workload() {
        let mut issue = issue();
        issue.estimation = Some(0.0);
        assert!(!issue.has_estimation());
        assert_eq!(issue.workload(), None);

        issue.estimation = Some(3.5);
        assert_eq!(issue.workload(), Some(3.5));
    }

    #[test]
    fn test_add_child_is_idempotent() {
        let mut parent = issue();
        assert!(parent.add_child("I_2"));
        assert!(!parent.add_child("I_2"));
        assert!(parent.add_child("I_3"));
        assert_eq!(parent.child_ids, vec!["I_2", "I_3"]);
    }

    #[test]
    fn test_empty_labels_fall_back_to_sentinels() {
        let mut issue = issue();
        issue.state = String::new();
        issue.team = String::new();
        issue.milestone = Some(String::new());
        assert_eq!(issue.state_label(), UNKNOWN_STATE);
        assert_eq!(issue.team_label(), UNSET);
        assert_eq!(issue.milestone_label(), UNSET);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let mut issue = issue();
        issue.parent_id = Some("I_0".into());
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["parentId"], "I_0");
        assert!(json.get("functionType").is_some());

        let back: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(back, issue);
    }
}
