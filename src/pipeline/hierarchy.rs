//! Parent/child reconstruction.
//!
//! Parent references are flat and may point outside the working set, so
//! every placement is relative to the slice it was computed for. Cycles are
//! not detected; issues on a cycle are all nested and never become roots.

use crate::error::{Error, Result};
use crate::model::Issue;
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};

/// Where an issue sits relative to a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// No parent reference
    TopLevel,
    /// Parent is another issue of the same working set
    Nested,
    /// Parent reference does not resolve within the working set
    Orphan,
}

/// Id index of one working set.
pub struct Hierarchy<'a> {
    ids: HashSet<&'a str>,
}

impl<'a> Hierarchy<'a> {
    #[must_use]
    pub fn new<I: Borrow<Issue>>(issues: &'a [I]) -> Self {
        Self {
            ids: issues.iter().map(|i| i.borrow().id.as_str()).collect(),
        }
    }

    /// Classify `issue` against this working set.
    #[must_use]
    pub fn placement(&self, issue: &Issue) -> Placement {
        match issue.parent_id.as_deref() {
            None => Placement::TopLevel,
            Some(parent) if parent != issue.id && self.ids.contains(parent) => Placement::Nested,
            Some(_) => Placement::Orphan,
        }
    }

    #[must_use]
    pub fn is_nested(&self, issue: &Issue) -> bool {
        self.placement(issue) == Placement::Nested
    }
}

/// A working set split by placement, each part in input order.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub top_level: Vec<&'a Issue>,
    pub nested: Vec<&'a Issue>,
    pub orphans: Vec<&'a Issue>,
}

#[must_use]
pub fn partition<I: Borrow<Issue>>(issues: &[I]) -> Partition<'_> {
    let hierarchy = Hierarchy::new(issues);
    let mut parts = Partition::default();

    for issue in issues.iter().map(Borrow::borrow) {
        match hierarchy.placement(issue) {
            Placement::TopLevel => parts.top_level.push(issue),
            Placement::Nested => parts.nested.push(issue),
            Placement::Orphan => parts.orphans.push(issue),
        }
    }

    parts
}

/// Rebuild `child_ids` for a full retrieval pass.
///
/// Existing child lists are discarded. Children are recorded sorted by id so
/// the result does not depend on input order.
///
/// # Errors
///
/// Returns a protocol error if two issues share an id.
pub fn link_children(issues: &mut [Issue]) -> Result<()> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(issues.len());
    for (pos, issue) in issues.iter().enumerate() {
        if index.insert(issue.id.clone(), pos).is_some() {
            return Err(Error::Protocol(format!(
                "Duplicate issue id {} in one retrieval pass",
                issue.id
            )));
        }
    }

    let mut links: Vec<(usize, String)> = Vec::new();
    for issue in issues.iter() {
        let Some(parent) = issue.parent_id.as_deref() else {
            continue;
        };
        if parent == issue.id {
            continue;
        }
        if let Some(&pos) = index.get(parent) {
            links.push((pos, issue.id.clone()));
        }
    }

    for issue in issues.iter_mut() {
        issue.child_ids.clear();
    }
    for (pos, child) in links {
        issues[pos].add_child(&child);
    }
    for issue in issues.iter_mut() {
        issue.child_ids.sort();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(id: &str, parent: Option<&str>) -> Issue {
        let mut issue = Issue::new(id, "acme", "api", 1, id, format!("https://x/{id}"));
        issue.parent_id = parent.map(String::from);
        issue
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("A", None),
            issue("B", Some("A")),
            issue("C", Some("A")),
            issue("D", Some("Z")),
            issue("E", Some("E")),
        ]
    }

    #[test]
    fn test_placement() {
        let issues = sample();
        let h = Hierarchy::new(&issues);
        let placements: Vec<_> = issues.iter().map(|i| h.placement(i)).collect();
        assert_eq!(
            placements,
            vec![
                Placement::TopLevel,
                Placement::Nested,
                Placement::Nested,
                Placement::Orphan,
                Placement::Orphan,
            ]
        );
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let issues = sample();
        let parts = partition(&issues);
        assert_eq!(
            parts.top_level.len() + parts.nested.len() + parts.orphans.len(),
            issues.len()
        );

        let mut seen: Vec<&str> = parts
            .top_level
            .iter()
            .chain(&parts.nested)
            .chain(&parts.orphans)
            .map(|i| i.id.as_str())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), issues.len());
    }

    #[test]
    fn test_placement_is_set_relative() {
        let issues = sample();
        let without_a: Vec<&Issue> = issues.iter().filter(|i| i.id != "A").collect();
        let parts = partition(&without_a);
        let orphans: Vec<_> = parts.orphans.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(orphans, vec!["B", "C", "D", "E"]);
        assert!(parts.nested.is_empty());
    }

    #[test]
    fn test_link_children() {
        let mut issues = sample();
        link_children(&mut issues).unwrap();
        assert_eq!(issues[0].child_ids, vec!["B", "C"]);
        assert!(issues[4].child_ids.is_empty(), "self-parent is not a child");
        assert!(issues[3].child_ids.is_empty());
    }

    #[test]
    fn test_link_children_is_idempotent_and_order_independent() {
        let mut forward = sample();
        link_children(&mut forward).unwrap();
        link_children(&mut forward).unwrap();

        let mut reversed = sample();
        reversed.reverse();
        link_children(&mut reversed).unwrap();

        let a_forward = forward.iter().find(|i| i.id == "A").unwrap();
        let a_reversed = reversed.iter().find(|i| i.id == "A").unwrap();
        assert_eq!(a_forward.child_ids, vec!["B", "C"]);
        assert_eq!(a_forward.child_ids, a_reversed.child_ids);
    }

    #[test]
    fn test_duplicate_id_fails() {
        let mut issues = vec![issue("A", None), issue("A", None)];
        assert!(matches!(link_children(&mut issues), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_cycle_members_are_nested() {
        let issues = vec![issue("X", Some("Y")), issue("Y", Some("X"))];
        let parts = partition(&issues);
        assert_eq!(parts.nested.len(), 2);
        assert!(parts.top_level.is_empty());
    }
}
