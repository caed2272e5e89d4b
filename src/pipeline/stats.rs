//! Aggregation over a filtered working set.
//!
//! Issues whose parent is present in the same input are left out so that
//! a parent and its children are never counted twice.

use super::hierarchy::Hierarchy;
use crate::model::{Issue, UNASSIGNED};
use serde::Serialize;
use std::borrow::Borrow;

/// Assignee entries per page.
pub const ASSIGNEE_PAGE_SIZE: usize = 10;

/// One `label → value` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally<V> {
    pub label: String,
    pub value: V,
}

fn bump<V: Copy + std::ops::AddAssign>(tallies: &mut Vec<Tally<V>>, label: &str, delta: V) {
    if let Some(entry) = tallies.iter_mut().find(|t| t.label == label) {
        entry.value += delta;
    } else {
        tallies.push(Tally {
            label: label.to_string(),
            value: delta,
        });
    }
}

/// Aggregated counts for one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub state: Vec<Tally<usize>>,
    pub priority: Vec<Tally<usize>>,
    pub milestone: Vec<Tally<usize>>,
    /// Sorted by descending count
    pub assignee: Vec<Tally<usize>>,
    /// Sorted by descending workload
    pub team_workload: Vec<Tally<f64>>,
    pub no_estimation_count: usize,
    /// Issues that entered aggregation
    pub stats_issue_count: usize,
    /// Issues in the filtered set
    pub total_issue_count: usize,
}

/// A page of the assignee breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneePage<'a> {
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub entries: &'a [Tally<usize>],
}

impl AggregationResult {
    /// Sum of all team workloads.
    #[must_use]
    pub fn total_workload(&self) -> f64 {
        self.team_workload.iter().map(|t| t.value).sum()
    }

    /// Page `page` (1-based) of the assignee breakdown, clamped to the
    /// valid range.
    #[must_use]
    pub fn assignee_page(&self, page: usize) -> AssigneePage<'_> {
        let total_pages = self.assignee.len().div_ceil(ASSIGNEE_PAGE_SIZE).max(1);
        let page = page.clamp(1, total_pages);
        let start = (page - 1) * ASSIGNEE_PAGE_SIZE;
        let end = (start + ASSIGNEE_PAGE_SIZE).min(self.assignee.len());
        AssigneePage {
            page,
            total_pages,
            entries: &self.assignee[start.min(end)..end],
        }
    }
}

/// Aggregate `issues`.
#[must_use]
pub fn aggregate<I: Borrow<Issue>>(issues: &[I]) -> AggregationResult {
    let hierarchy = Hierarchy::new(issues);
    let mut result = AggregationResult {
        total_issue_count: issues.len(),
        ..AggregationResult::default()
    };

    for issue in issues
        .iter()
        .map(Borrow::borrow)
        .filter(|i| !hierarchy.is_nested(i))
    {
        result.stats_issue_count += 1;
        bump(&mut result.state, issue.state_label(), 1);
        bump(&mut result.priority, issue.priority_label(), 1);
        bump(&mut result.milestone, issue.milestone_label(), 1);

        match issue.workload() {
            Some(estimate) => bump(&mut result.team_workload, issue.team_label(), estimate),
            None => result.no_estimation_count += 1,
        }

        if issue.is_unassigned() {
            bump(&mut result.assignee, UNASSIGNED, 1);
        } else {
            for login in &issue.assignees {
                bump(&mut result.assignee, login, 1);
            }
        }
    }

    result.assignee.sort_by(|a, b| b.value.cmp(&a.value));
    result
        .team_workload
        .sort_by(|a, b| b.value.total_cmp(&a.value));

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNSET;

    fn issue(id: &str, parent: Option<&str>, estimation: Option<f64>, team: &str) -> Issue {
        let mut issue = Issue::new(id, "acme", "api", 1, id, format!("https://x/{id}"));
        issue.parent_id = parent.map(String::from);
        issue.estimation = estimation;
        issue.team = team.to_string();
        issue
    }

    fn abc() -> Vec<Issue> {
        vec![
            issue("A", None, Some(5.0), "Core"),
            issue("B", Some("A"), Some(2.0), "Core"),
            issue("C", Some("A"), Some(3.0), "Core"),
        ]
    }

    #[test]
    fn test_parent_with_children_counts_once() {
        let result = aggregate(&abc());
        assert_eq!(result.stats_issue_count, 1);
        assert_eq!(result.total_issue_count, 3);
        assert_eq!(
            result.team_workload,
            vec![Tally {
                label: "Core".into(),
                value: 5.0
            }]
        );
        assert_eq!(result.no_estimation_count, 0);
    }

    #[test]
    fn test_orphans_enter_stats_when_parent_filtered_out() {
        let issues = abc();
        let without_parent: Vec<&Issue> = issues.iter().filter(|i| i.id != "A").collect();
        let result = aggregate(&without_parent);
        assert_eq!(result.stats_issue_count, 2);
        assert_eq!(result.total_issue_count, 2);
        assert!((result.total_workload() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parent_child_and_unestimated_sibling() {
        let issues = vec![
            issue("1", None, Some(5.0), "X"),
            issue("2", Some("1"), Some(2.0), "X"),
            issue("3", None, None, UNSET),
        ];

        let result = aggregate(&issues);
        let parts = crate::pipeline::partition(&issues);
        let counted: Vec<_> = parts.top_level.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(counted, vec!["1", "3"]);
        assert_eq!(result.stats_issue_count, 2);
        assert_eq!(result.total_issue_count, 3);
        assert_eq!(
            result.team_workload,
            vec![Tally {
                label: "X".into(),
                value: 5.0
            }]
        );
        assert_eq!(result.no_estimation_count, 1);

        let view = crate::pipeline::build_view(&issues);
        let parent = view.roots.iter().find(|r| r.issue.id == "1").unwrap();
        assert!(parent.mismatch);
        assert!(!view.roots.iter().find(|r| r.issue.id == "3").unwrap().mismatch);

        // Filtering the parent out lets its child into the stats set
        let without_parent: Vec<&Issue> = issues.iter().filter(|i| i.id != "1").collect();
        let result = aggregate(&without_parent);
        let parts = crate::pipeline::partition(&without_parent);
        assert_eq!(parts.orphans.len(), 1);
        assert_eq!(parts.orphans[0].id, "2");
        assert_eq!(parts.top_level[0].id, "3");
        assert_eq!(result.stats_issue_count, 2);
        assert_eq!(
            result.team_workload,
            vec![Tally {
                label: "X".into(),
                value: 2.0
            }]
        );
        assert_eq!(result.no_estimation_count, 1);
    }

    #[test]
    fn test_stats_count_bounds() {
        let flat = vec![issue("X", None, None, UNSET), issue("Y", Some("gone"), None, UNSET)];
        let result = aggregate(&flat);
        assert_eq!(result.stats_issue_count, result.total_issue_count);

        let nested = abc();
        let result = aggregate(&nested);
        assert!(result.stats_issue_count < result.total_issue_count);
    }

    #[test]
    fn test_workload_partition() {
        let issues = vec![
            issue("1", None, Some(4.0), "Core"),
            issue("2", None, Some(0.0), "Core"),
            issue("3", None, None, "Web"),
            issue("4", None, Some(1.5), UNSET),
        ];
        let result = aggregate(&issues);
        let estimated = issues.iter().filter(|i| i.has_estimation()).count();
        assert_eq!(estimated + result.no_estimation_count, result.stats_issue_count);
        assert!((result.total_workload() - 5.5).abs() < 1e-9);
        assert_eq!(result.team_workload[0].label, "Core");
        assert_eq!(result.team_workload[1].label, UNSET);
    }

    #[test]
    fn test_assignee_counts() {
        let mut issues = vec![
            issue("1", None, None, UNSET),
            issue("2", None, None, UNSET),
            issue("3", None, None, UNSET),
        ];
        issues[0].assignees = vec!["mei".into()];
        issues[1].assignees = vec!["tom".into(), "mei".into()];

        let result = aggregate(&issues);
        let labels: Vec<_> = result.assignee.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["mei", "tom", UNASSIGNED]);
        assert_eq!(result.assignee[0].value, 2);
    }

    #[test]
    fn test_descending_sort_is_stable() {
        let issues = vec![
            issue("1", None, Some(1.0), "Web"),
            issue("2", None, Some(1.0), "Core"),
            issue("3", None, Some(2.0), "Ops"),
        ];
        let result = aggregate(&issues);
        let labels: Vec<_> = result.team_workload.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Ops", "Web", "Core"]);
    }

    #[test]
    fn test_facet_counts_keep_insertion_order() {
        let mut issues = vec![
            issue("1", None, None, UNSET),
            issue("2", None, None, UNSET),
            issue("3", None, None, UNSET),
        ];
        issues[0].state = "Todo".into();
        issues[1].state = "Done".into();
        issues[2].state = "Done".into();
        issues[2].milestone = Some("v1".into());

        let result = aggregate(&issues);
        assert_eq!(result.state[0].label, "Todo");
        assert_eq!(result.state[1].value, 2);
        assert_eq!(result.milestone[0].label, UNSET);
        assert_eq!(result.milestone[1].label, "v1");
    }

    #[test]
    fn test_assignee_pages() {
        let mut issues = Vec::new();
        for n in 0..23 {
            let mut i = issue(&n.to_string(), None, None, UNSET);
            i.assignees = vec![format!("user{n:02}")];
            issues.push(i);
        }
        let result = aggregate(&issues);

        let first = result.assignee_page(1);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.entries.len(), 10);

        let last = result.assignee_page(99);
        assert_eq!(last.page, 3);
        assert_eq!(last.entries.len(), 3);

        assert_eq!(result.assignee_page(0).page, 1);
    }

    #[test]
    fn test_empty_input() {
        let result = aggregate::<Issue>(&[]);
        assert_eq!(result, AggregationResult::default());
        let page = result.assignee_page(1);
        assert_eq!(page.total_pages, 1);
        assert!(page.entries.is_empty());
    }
}
