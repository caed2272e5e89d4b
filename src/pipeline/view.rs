//! Issue tree for the filtered list.
//!
//! Roots are the filtered issues whose parent is not in the view. Each root
//! carries its in-view descendants and every node with children gets an
//! estimation consistency check.

use super::hierarchy::{Hierarchy, Placement};
use crate::model::Issue;
use serde::Serialize;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tolerance for the parent-vs-children estimation comparison.
pub const ESTIMATION_TOLERANCE: f64 = 1e-9;

/// Coarse urgency bucket derived from a free-form priority label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTone {
    High,
    Medium,
    Low,
    None,
}

impl PriorityTone {
    #[must_use]
    pub fn of(priority: &str) -> Self {
        let p = priority.to_lowercase();
        if ["p0", "high", "critical"].iter().any(|k| p.contains(k)) {
            Self::High
        } else if ["p1", "medium"].iter().any(|k| p.contains(k)) {
            Self::Medium
        } else if ["p2", "low"].iter().any(|k| p.contains(k)) {
            Self::Low
        } else {
            Self::None
        }
    }
}

/// One issue in the tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode<'a> {
    pub issue: &'a Issue,
    /// In-view children, in working-set order
    pub children: Vec<IssueNode<'a>>,
    /// Parent reference points outside the view
    pub orphan: bool,
    /// Root whose estimation disagrees with the sum of its children's
    /// estimations. Always false below the top level.
    pub mismatch: bool,
}

impl IssueNode<'_> {
    /// Number of nodes below this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// The filtered list as a forest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView<'a> {
    pub roots: Vec<IssueNode<'a>>,
    /// Issues in the view
    pub issue_count: usize,
    /// Issues shown under a parent
    pub nested_count: usize,
    /// Sum of root estimations
    pub total_estimation: f64,
}

impl IssueView<'_> {
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.roots.iter().filter(|r| r.mismatch).count()
    }
}

/// Whether a parent's estimation disagrees with its children's.
///
/// Only checked when the parent has a positive estimation and at least one
/// child does too.
#[must_use]
pub fn estimation_mismatch<I: Borrow<Issue>>(parent: &Issue, children: &[I]) -> bool {
    let Some(parent_estimation) = parent.workload() else {
        return false;
    };
    if !children.iter().any(|c| c.borrow().has_estimation()) {
        return false;
    }
    let sum: f64 = children
        .iter()
        .map(|c| c.borrow().estimation.unwrap_or(0.0))
        .sum();
    (parent_estimation - sum).abs() > ESTIMATION_TOLERANCE
}

fn by_function_type(a: &Issue, b: &Issue) -> Ordering {
    match (a.function_type.is_empty(), b.function_type.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.function_type.cmp(&b.function_type),
    }
}

/// Build the tree for a filtered working set.
#[must_use]
pub fn build_view<I: Borrow<Issue>>(filtered: &[I]) -> IssueView<'_> {
    let hierarchy = Hierarchy::new(filtered);
    let mut children_of: HashMap<&str, Vec<&Issue>> = HashMap::new();
    let mut roots: Vec<&Issue> = Vec::new();
    let mut nested_count = 0;

    for issue in filtered.iter().map(Borrow::borrow) {
        if hierarchy.placement(issue) == Placement::Nested {
            nested_count += 1;
            if let Some(parent) = issue.parent_id.as_deref() {
                children_of.entry(parent).or_default().push(issue);
            }
        } else {
            roots.push(issue);
        }
    }

    roots.sort_by(|a, b| by_function_type(a, b));

    let total_estimation = roots.iter().map(|r| r.estimation.unwrap_or(0.0)).sum();
    let roots = roots
        .into_iter()
        .map(|root| {
            let orphan = hierarchy.placement(root) == Placement::Orphan;
            node(root, orphan, true, &children_of)
        })
        .collect();

    IssueView {
        roots,
        issue_count: filtered.len(),
        nested_count,
        total_estimation,
    }
}

fn node<'a>(
    issue: &'a Issue,
    orphan: bool,
    is_root: bool,
    children_of: &HashMap<&str, Vec<&'a Issue>>,
) -> IssueNode<'a> {
    let direct = children_of
        .get(issue.id.as_str())
        .map(Vec::as_slice)
        .unwrap_or_default();

    IssueNode {
        issue,
        mismatch: is_root && estimation_mismatch(issue, direct),
        children: direct
            .iter()
            .map(|&child| node(child, false, false, children_of))
            .collect(),
        orphan,
    }
}
