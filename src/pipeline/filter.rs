//! Multi-facet AND filter.
//!
//! Each facet is either unset or holds one selected value. Facets are
//! mutated one at a time by toggling: selecting the active value again
//! clears that facet.

use crate::error::{Error, Result};
use crate::model::{Issue, UNASSIGNED};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Assignee facet selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "login", rename_all = "lowercase")]
pub enum AssigneeFilter {
    /// Matches issues with no assignees only
    Unassigned,
    /// Matches issues assigned to this login
    Login(String),
}

impl AssigneeFilter {
    /// Parse CLI input; the `Unassigned` sentinel (any case) selects
    /// unassigned issues.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(UNASSIGNED) {
            Self::Unassigned
        } else {
            Self::Login(value.to_string())
        }
    }

    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Self::Unassigned => issue.is_unassigned(),
            Self::Login(login) => issue.assignees.iter().any(|a| a == login),
        }
    }
}

impl fmt::Display for AssigneeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => f.write_str(UNASSIGNED),
            Self::Login(login) => f.write_str(login),
        }
    }
}

/// A single-facet selection used for toggling.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetSelection {
    State(String),
    Priority(String),
    Milestone(String),
    Assignee(AssigneeFilter),
    Team(String),
    HasEstimation(bool),
}

impl FacetSelection {
    /// Build a selection from a facet name and a value.
    ///
    /// The `estimation` facet accepts `yes`/`true`/`set` and
    /// `no`/`false`/`unset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown facet or an
    /// unparseable estimation value.
    pub fn parse(facet: &str, value: &str) -> Result<Self> {
        let selection = match facet.to_lowercase().as_str() {
            "state" | "status" => Self::State(value.to_string()),
            "priority" => Self::Priority(value.to_string()),
            "milestone" => Self::Milestone(value.to_string()),
            "assignee" => Self::Assignee(AssigneeFilter::parse(value)),
            "team" => Self::Team(value.to_string()),
            "estimation" | "has-estimation" => match value.to_lowercase().as_str() {
                "yes" | "true" | "set" => Self::HasEstimation(true),
                "no" | "false" | "unset" => Self::HasEstimation(false),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "Invalid estimation value '{other}': expected yes or no"
                    )));
                }
            },
            other => {
                return Err(Error::InvalidArgument(format!("Unknown facet '{other}'")));
            }
        };
        Ok(selection)
    }
}

/// A slice of the workload breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadSlice {
    /// Estimated work of one team
    Team(String),
    /// Issues without an estimate
    NoEstimation,
}

/// Active filter state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub state: Option<String>,
    pub priority: Option<String>,
    pub milestone: Option<String>,
    pub assignee: Option<AssigneeFilter>,
    pub team: Option<String>,
    pub has_estimation: Option<bool>,
}

fn toggle_value<T: PartialEq>(slot: &mut Option<T>, value: T) {
    if slot.as_ref() == Some(&value) {
        *slot = None;
    } else {
        *slot = Some(value);
    }
}

impl Filter {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
            || self.priority.is_some()
            || self.milestone.is_some()
            || self.assignee.is_some()
            || self.team.is_some()
            || self.has_estimation.is_some()
    }

    /// Toggle one facet.
    pub fn toggle(&mut self, selection: FacetSelection) {
        match selection {
            FacetSelection::State(v) => toggle_value(&mut self.state, v),
            FacetSelection::Priority(v) => toggle_value(&mut self.priority, v),
            FacetSelection::Milestone(v) => toggle_value(&mut self.milestone, v),
            FacetSelection::Assignee(v) => toggle_value(&mut self.assignee, v),
            FacetSelection::Team(v) => toggle_value(&mut self.team, v),
            FacetSelection::HasEstimation(v) => toggle_value(&mut self.has_estimation, v),
        }
    }

    /// Toggle a workload slice.
    ///
    /// A team slice selects that team's estimated issues; the no-estimation
    /// slice selects unestimated issues of every team. Selecting the active
    /// slice again clears both facets.
    pub fn toggle_workload(&mut self, slice: WorkloadSlice) {
        match slice {
            WorkloadSlice::Team(team) => {
                if self.team.as_deref() == Some(team.as_str()) && self.has_estimation == Some(true)
                {
                    self.team = None;
                    self.has_estimation = None;
                } else {
                    self.team = Some(team);
                    self.has_estimation = Some(true);
                }
            }
            WorkloadSlice::NoEstimation => {
                self.team = None;
                self.has_estimation = if self.has_estimation == Some(false) {
                    None
                } else {
                    Some(false)
                };
            }
        }
    }

    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        self.state.as_deref().is_none_or(|s| issue.state_label() == s)
            && self
                .priority
                .as_deref()
                .is_none_or(|p| issue.priority_label() == p)
            && self
                .milestone
                .as_deref()
                .is_none_or(|m| issue.milestone_label() == m)
            && self.assignee.as_ref().is_none_or(|a| a.matches(issue))
            && self.team.as_deref().is_none_or(|t| issue.team_label() == t)
            && self
                .has_estimation
                .is_none_or(|wanted| issue.has_estimation() == wanted)
    }

    /// Matching issues in input order.
    #[must_use]
    pub fn apply<'a, I: Borrow<Issue>>(&self, issues: &'a [I]) -> Vec<&'a Issue> {
        issues
            .iter()
            .map(Borrow::borrow)
            .filter(|issue| self.matches(issue))
            .collect()
    }

    /// Active facets as `facet: value` pairs, in facet order.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let mut active = Vec::new();
        if let Some(v) = &self.state {
            active.push(("state", v.clone()));
        }
        if let Some(v) = &self.priority {
            active.push(("priority", v.clone()));
        }
        if let Some(v) = &self.milestone {
            active.push(("milestone", v.clone()));
        }
        if let Some(v) = &self.assignee {
            active.push(("assignee", v.to_string()));
        }
        if let Some(v) = &self.team {
            active.push(("team", v.clone()));
        }
        match self.has_estimation {
            Some(true) => active.push(("estimation", "yes".to_string())),
            Some(false) => active.push(("estimation", "no".to_string())),
            None => {}
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNSET;

    fn issue(id: &str, assignees: &[&str], estimation: Option<f64>, team: &str) -> Issue {
        let mut issue = Issue::new(id, "acme", "api", 1, id, format!("https://x/{id}"));
        issue.assignees = assignees.iter().map(|a| (*a).to_string()).collect();
        issue.estimation = estimation;
        issue.team = team.to_string();
        issue.state = "Todo".to_string();
        issue
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("1", &["mei"], Some(3.0), "Core"),
            issue("2", &[], None, "Core"),
            issue("3", &["tom", "mei"], Some(0.0), "Web"),
            issue("4", &[], Some(2.0), UNSET),
        ]
    }

    fn ids(issues: &[&Issue]) -> Vec<String> {
        issues.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let issues = sample();
        let filter = Filter::default();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&issues).len(), issues.len());
    }

    #[test]
    fn test_toggle_same_value_clears() {
        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Team("Core".into()));
        assert_eq!(filter.team.as_deref(), Some("Core"));
        filter.toggle(FacetSelection::Team("Web".into()));
        assert_eq!(filter.team.as_deref(), Some("Web"));
        filter.toggle(FacetSelection::Team("Web".into()));
        assert!(filter.team.is_none());
    }

    #[test]
    fn test_unassigned_is_distinct_from_login() {
        let mut issues = sample();
        issues.push(issue("5", &["Unassigned"], None, "Core"));

        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Assignee(AssigneeFilter::Unassigned));
        assert_eq!(ids(&filter.apply(&issues)), vec!["2", "4"]);

        let mut literal = Filter::default();
        literal.toggle(FacetSelection::Assignee(AssigneeFilter::Login(
            "Unassigned".into(),
        )));
        assert_eq!(ids(&literal.apply(&issues)), vec!["5"]);
    }

    #[test]
    fn test_estimation_facet() {
        let issues = sample();
        let mut filter = Filter::default();
        filter.toggle(FacetSelection::HasEstimation(true));
        assert_eq!(ids(&filter.apply(&issues)), vec!["1", "4"]);

        filter.toggle(FacetSelection::HasEstimation(false));
        assert_eq!(ids(&filter.apply(&issues)), vec!["2", "3"]);
    }

    #[test]
    fn test_and_monotonicity() {
        let issues = sample();
        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Assignee(AssigneeFilter::Login("mei".into())));
        let broad = ids(&filter.apply(&issues));

        filter.toggle(FacetSelection::Team("Core".into()));
        let narrow = ids(&filter.apply(&issues));

        assert!(narrow.iter().all(|id| broad.contains(id)));
        assert_eq!(narrow, vec!["1"]);
    }

    #[test]
    fn test_sentinel_comparisons() {
        let mut issues = sample();
        issues[0].milestone = Some("v1".into());
        issues[1].team = String::new();

        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Milestone(UNSET.into()));
        assert_eq!(ids(&filter.apply(&issues)), vec!["2", "3", "4"]);

        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Team(UNSET.into()));
        assert_eq!(ids(&filter.apply(&issues)), vec!["2", "4"]);
    }

    #[test]
    fn test_workload_toggle() {
        let mut filter = Filter::default();
        filter.toggle_workload(WorkloadSlice::Team("Core".into()));
        assert_eq!(filter.team.as_deref(), Some("Core"));
        assert_eq!(filter.has_estimation, Some(true));

        filter.toggle_workload(WorkloadSlice::NoEstimation);
        assert!(filter.team.is_none());
        assert_eq!(filter.has_estimation, Some(false));

        filter.toggle_workload(WorkloadSlice::NoEstimation);
        assert!(filter.team.is_none());
        assert!(filter.has_estimation.is_none());

        filter.toggle_workload(WorkloadSlice::Team("Core".into()));
        filter.toggle_workload(WorkloadSlice::Team("Core".into()));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_team_slice_over_plain_team_facet() {
        let mut filter = Filter::default();
        filter.toggle(FacetSelection::Team("Core".into()));
        filter.toggle_workload(WorkloadSlice::Team("Core".into()));
        assert_eq!(filter.team.as_deref(), Some("Core"));
        assert_eq!(filter.has_estimation, Some(true));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            FacetSelection::parse("Assignee", "unassigned").unwrap(),
            FacetSelection::Assignee(AssigneeFilter::Unassigned)
        );
        assert_eq!(
            FacetSelection::parse("estimation", "no").unwrap(),
            FacetSelection::HasEstimation(false)
        );
        let err = FacetSelection::parse("label", "bug").unwrap_err();
        assert!(err.hint().unwrap().contains("Valid facets"));
        assert!(FacetSelection::parse("estimation", "maybe").is_err());
    }

    #[test]
    fn test_describe_and_serde() {
        let mut filter = Filter::default();
        filter.toggle(FacetSelection::State("Todo".into()));
        filter.toggle(FacetSelection::Assignee(AssigneeFilter::Unassigned));
        filter.toggle(FacetSelection::HasEstimation(false));
        assert_eq!(
            filter.describe(),
            vec![
                ("state", "Todo".to_string()),
                ("assignee", "Unassigned".to_string()),
                ("estimation", "no".to_string()),
            ]
        );

        let json = serde_json::to_string(&filter).unwrap();
        let back: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }
}
