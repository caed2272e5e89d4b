//! Raw item → canonical [`Issue`].
//!
//! Custom fields are decoded into a typed [`FieldValue`] and routed through
//! a fixed table of recognized field names. Names match case-insensitively
//! and the first field with a given name wins; later duplicates are ignored.

use crate::github::{RawFieldValue, RawItem};
use crate::model::{Issue, UNKNOWN_STATE, UNSET};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Lifecycle state GitHub reports for closed issues.
const CLOSED_STATE: &str = "CLOSED";

/// Why a raw item did not become an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Missing identity, url or repository (drafts, pull requests, redacted items)
    Malformed(&'static str),
    /// Closed issues are never materialized
    Closed,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed record: {reason}"),
            Self::Closed => write!(f, "issue is closed"),
        }
    }
}

/// A decoded custom field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    SingleSelect(String),
    Text(String),
    Number(f64),
    Date(String),
    Iteration(String),
}

impl FieldValue {
    /// Decode by `__typename`, falling back to whichever property is set.
    #[must_use]
    pub fn decode(raw: &RawFieldValue) -> Option<Self> {
        match raw.typename.as_deref() {
            Some("ProjectV2ItemFieldSingleSelectValue") => raw.name.clone().map(Self::SingleSelect),
            Some("ProjectV2ItemFieldTextValue") => raw.text.clone().map(Self::Text),
            Some("ProjectV2ItemFieldNumberValue") => raw.number.map(Self::Number),
            Some("ProjectV2ItemFieldDateValue") => raw.date.clone().map(Self::Date),
            Some("ProjectV2ItemFieldIterationValue") => raw.title.clone().map(Self::Iteration),
            _ => raw
                .number
                .map(Self::Number)
                .or_else(|| raw.name.clone().map(Self::SingleSelect))
                .or_else(|| raw.text.clone().map(Self::Text))
                .or_else(|| raw.title.clone().map(Self::Iteration))
                .or_else(|| raw.date.clone().map(Self::Date)),
        }
    }
}

/// Custom fields the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownField {
    Status,
    Priority,
    Estimation,
    Team,
    FunctionType,
}

/// Recognized field names (lowercase) and their slots.
const FIELD_TABLE: &[(&str, KnownField)] = &[
    ("status", KnownField::Status),
    ("priority", KnownField::Priority),
    ("estimation", KnownField::Estimation),
    ("team", KnownField::Team),
    ("functiontype", KnownField::FunctionType),
];

impl KnownField {
    /// Case-insensitive lookup of a board field name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        FIELD_TABLE
            .iter()
            .find(|(known, _)| *known == lower)
            .map(|(_, field)| *field)
    }

    fn apply(self, value: Option<&FieldValue>, out: &mut CustomFields) {
        match self {
            Self::Status => out.status = value.and_then(select_or_text),
            Self::Priority => out.priority = value.and_then(select_or_text),
            Self::FunctionType => out.function_type = value.and_then(select_or_text),
            Self::Team => out.team = value.and_then(team_label),
            Self::Estimation => out.estimation = value.and_then(estimate),
        }
    }
}

fn select_or_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::SingleSelect(s) | FieldValue::Text(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn team_label(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::SingleSelect(s) | FieldValue::Text(s) | FieldValue::Iteration(s)
            if !s.is_empty() =>
        {
            Some(s.clone())
        }
        _ => None,
    }
}

fn estimate(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct CustomFields {
    status: Option<String>,
    priority: Option<String>,
    function_type: Option<String>,
    team: Option<String>,
    estimation: Option<f64>,
}

impl CustomFields {
    fn extract(item: &RawItem) -> Self {
        let mut out = Self::default();
        let mut claimed: Vec<KnownField> = Vec::new();

        let Some(values) = item.field_values.as_ref() else {
            return out;
        };

        for raw in values.present() {
            let Some(name) = raw.field.as_ref().and_then(|f| f.name.as_deref()) else {
                continue;
            };
            let Some(field) = KnownField::lookup(name) else {
                trace!(field = name, "Ignoring unrecognized board field");
                continue;
            };
            if claimed.contains(&field) {
                continue;
            }
            claimed.push(field);
            field.apply(FieldValue::decode(raw).as_ref(), &mut out);
        }

        out
    }
}

/// Normalize one raw item.
///
/// # Errors
///
/// Returns a [`Rejection`] for closed issues and for items without id, url
/// or repository.
pub fn normalize(item: &RawItem, board_title: &str) -> Result<Issue, Rejection> {
    let content = item
        .content
        .as_ref()
        .ok_or(Rejection::Malformed("no content"))?;
    let url = content
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(Rejection::Malformed("missing url"))?;
    let id = content
        .id
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or(Rejection::Malformed("missing id"))?;

    if content
        .state
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case(CLOSED_STATE))
    {
        return Err(Rejection::Closed);
    }

    let repository = content
        .repository
        .as_ref()
        .ok_or(Rejection::Malformed("missing repository"))?;
    let repo = repository
        .name
        .as_deref()
        .ok_or(Rejection::Malformed("missing repository name"))?;
    let owner = repository
        .owner
        .as_ref()
        .and_then(|o| o.login.as_deref())
        .ok_or(Rejection::Malformed("missing repository owner"))?;

    let fields = CustomFields::extract(item);

    let mut issue = Issue::new(
        id,
        owner,
        repo,
        content.number.unwrap_or_default(),
        content.title.clone().unwrap_or_default(),
        url,
    );
    issue.state = fields.status.unwrap_or_else(|| UNKNOWN_STATE.to_string());
    issue.priority = fields.priority.unwrap_or_else(|| UNSET.to_string());
    issue.function_type = fields.function_type.unwrap_or_default();
    issue.team = fields.team.unwrap_or_else(|| UNSET.to_string());
    issue.estimation = fields.estimation;
    issue.milestone = content
        .milestone
        .as_ref()
        .and_then(|m| m.title.clone())
        .filter(|t| !t.is_empty());
    issue.updated_at = content.updated_at.as_deref().and_then(parse_timestamp);
    issue.board = board_title.to_string();
    issue.parent_id = content
        .parent
        .as_ref()
        .and_then(|p| p.id.clone())
        .filter(|p| !p.is_empty());

    if let Some(labels) = &content.labels {
        for name in labels.present().filter_map(|l| l.name.as_deref()) {
            if !issue.labels.iter().any(|l| l == name) {
                issue.labels.push(name.to_string());
            }
        }
    }
    if let Some(assignees) = &content.assignees {
        issue.assignees = assignees
            .present()
            .filter_map(|a| a.login.clone())
            .collect();
    }

    Ok(issue)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Result of normalizing a whole batch.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    /// Open issues in input order
    pub issues: Vec<Issue>,
    pub closed: usize,
    pub malformed: usize,
}

/// Normalize a batch, dropping rejected records.
#[must_use]
pub fn normalize_all(items: &[RawItem], board_title: &str) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for item in items {
        match normalize(item, board_title) {
            Ok(issue) => outcome.issues.push(issue),
            Err(Rejection::Closed) => outcome.closed += 1,
            Err(rejection @ Rejection::Malformed(_)) => {
                debug!(%rejection, "Dropping project item");
                outcome.malformed += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn raw(content: Value, fields: Value) -> RawItem {
        serde_json::from_value(json!({
            "content": content,
            "fieldValues": { "nodes": fields }
        }))
        .unwrap()
    }

    fn content(id: &str, state: &str) -> Value {
        json!({
            "id": id,
            "number": 12,
            "title": "Checkout flow",
            "state": state,
            "url": format!("https://github.com/acme/shop/issues/{id}"),
            "updatedAt": "2026-03-01T08:30:00Z",
            "milestone": { "title": "v2.0" },
            "labels": { "nodes": [{ "name": "bug" }, { "name": "ui" }, { "name": "bug" }] },
            "assignees": { "nodes": [{ "login": "mei" }, { "login": "tom" }] },
            "repository": { "name": "shop", "owner": { "login": "acme" } },
            "parent": { "id": "I_parent" }
        })
    }

    fn select(field: &str, value: &str) -> Value {
        json!({
            "__typename": "ProjectV2ItemFieldSingleSelectValue",
            "field": { "name": field },
            "name": value
        })
    }

    fn number(field: &str, value: f64) -> Value {
        json!({
            "__typename": "ProjectV2ItemFieldNumberValue",
            "field": { "name": field },
            "number": value
        })
    }

    fn text(field: &str, value: &str) -> Value {
        json!({
            "__typename": "ProjectV2ItemFieldTextValue",
            "field": { "name": field },
            "text": value
        })
    }

    #[test]
    fn test_full_record() {
        let item = raw(
            content("I_1", "OPEN"),
            json!([
                select("Status", "In Progress"),
                select("PRIORITY", "P1"),
                number("Estimation", 5.0),
                select("team", "Payments"),
                text("FunctionType", "Backend"),
                { "__typename": "ProjectV2ItemFieldDateValue", "field": { "name": "Due" }, "date": "2026-04-01" }
            ]),
        );

        let issue = normalize(&item, "Roadmap").unwrap();
        assert_eq!(issue.id, "I_1");
        assert_eq!(issue.owner, "acme");
        assert_eq!(issue.repo, "shop");
        assert_eq!(issue.number, 12);
        assert_eq!(issue.state, "In Progress");
        assert_eq!(issue.priority, "P1");
        assert_eq!(issue.estimation, Some(5.0));
        assert_eq!(issue.team, "Payments");
        assert_eq!(issue.function_type, "Backend");
        assert_eq!(issue.milestone.as_deref(), Some("v2.0"));
        assert_eq!(issue.labels, vec!["bug", "ui"]);
        assert_eq!(issue.assignees, vec!["mei", "tom"]);
        assert_eq!(issue.parent_id.as_deref(), Some("I_parent"));
        assert_eq!(issue.board, "Roadmap");
        assert!(issue.updated_at.is_some());
        assert!(issue.child_ids.is_empty());
    }

    #[test]
    fn test_defaults_when_fields_absent() {
        let item = raw(content("I_2", "OPEN"), json!([]));
        let issue = normalize(&item, "Roadmap").unwrap();
        assert_eq!(issue.state, UNKNOWN_STATE);
        assert_eq!(issue.priority, UNSET);
        assert_eq!(issue.team, UNSET);
        assert_eq!(issue.function_type, "");
        assert_eq!(issue.estimation, None);
    }

    #[test]
    fn test_closed_items_are_rejected() {
        let item = raw(content("I_3", "CLOSED"), json!([]));
        assert_eq!(normalize(&item, "Roadmap"), Err(Rejection::Closed));
    }

    #[test]
    fn test_items_without_url_or_id_are_malformed() {
        let draft = raw(json!({}), json!([]));
        assert!(matches!(normalize(&draft, "B"), Err(Rejection::Malformed(_))));

        let no_id = raw(
            json!({ "url": "https://github.com/acme/shop/issues/1", "state": "OPEN" }),
            json!([]),
        );
        assert_eq!(normalize(&no_id, "B"), Err(Rejection::Malformed("missing id")));

        let redacted: RawItem = serde_json::from_value(json!({ "content": null })).unwrap();
        assert_eq!(normalize(&redacted, "B"), Err(Rejection::Malformed("no content")));
    }

    #[test]
    fn test_first_matching_field_wins() {
        let item = raw(
            content("I_4", "OPEN"),
            json!([select("status", "Todo"), select("Status", "Done")]),
        );
        assert_eq!(normalize(&item, "B").unwrap().state, "Todo");
    }

    #[test]
    fn test_numbers_only_feed_estimation() {
        let item = raw(
            content("I_5", "OPEN"),
            json!([number("Status", 3.0), text("Estimation", "8")]),
        );
        let issue = normalize(&item, "B").unwrap();
        assert_eq!(issue.state, UNKNOWN_STATE);
        assert_eq!(issue.estimation, None);
    }

    #[test]
    fn test_negative_estimation_is_dropped() {
        let item = raw(content("I_6", "OPEN"), json!([number("Estimation", -2.0)]));
        assert_eq!(normalize(&item, "B").unwrap().estimation, None);
    }

    #[test]
    fn test_team_accepts_iteration_title() {
        let item = raw(
            content("I_7", "OPEN"),
            json!([{
                "__typename": "ProjectV2ItemFieldIterationValue",
                "field": { "name": "Team" },
                "title": "Sprint Crew"
            }]),
        );
        assert_eq!(normalize(&item, "B").unwrap().team, "Sprint Crew");
    }

    #[test]
    fn test_untyped_value_is_inferred() {
        let raw_value = RawFieldValue {
            number: Some(2.0),
            ..RawFieldValue::default()
        };
        assert_eq!(FieldValue::decode(&raw_value), Some(FieldValue::Number(2.0)));

        let raw_value = RawFieldValue {
            name: Some("High".into()),
            ..RawFieldValue::default()
        };
        assert_eq!(
            FieldValue::decode(&raw_value),
            Some(FieldValue::SingleSelect("High".into()))
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(KnownField::lookup("FunctionType"), Some(KnownField::FunctionType));
        assert_eq!(KnownField::lookup("ESTIMATION"), Some(KnownField::Estimation));
        assert_eq!(KnownField::lookup("Sprint"), None);
    }

    #[test]
    fn test_normalize_all_counts_rejections() {
        let items = vec![
            raw(content("I_1", "OPEN"), json!([])),
            raw(content("I_2", "CLOSED"), json!([])),
            raw(json!({}), json!([])),
            raw(content("I_3", "OPEN"), json!([])),
        ];
        let outcome = normalize_all(&items, "B");
        let ids: Vec<_> = outcome.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["I_1", "I_3"]);
        assert_eq!(outcome.closed, 1);
        assert_eq!(outcome.malformed, 1);
    }
}
