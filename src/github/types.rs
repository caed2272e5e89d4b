//! Raw GraphQL response shapes.
//!
//! These mirror the JSON returned by the GitHub GraphQL API for the queries
//! in [`super::queries`]. Everything that GitHub may omit or null out is an
//! `Option` so that a single odd item never fails the whole page; the
//! normalizer decides what is usable.

use serde::{Deserialize, Serialize};

/// Request body for a GraphQL call.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<V>,
}

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// One entry of the `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    /// GitHub-specific classification such as `NOT_FOUND` or `FORBIDDEN`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Generic `{ nodes: [...] }` connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default)]
    pub nodes: Option<Vec<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: None }
    }
}

impl<T> Connection<Option<T>> {
    /// Iterate the non-null nodes.
    pub fn present(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().flatten().flatten()
    }

    /// Take the non-null nodes by value.
    pub fn into_present(self) -> Vec<T> {
        self.nodes.into_iter().flatten().flatten().collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Titled {
    pub title: Option<String>,
}

// ── Project items ─────────────────────────────────────────────

/// `data` of the items query. The owner root field is aliased to `owner`.
#[derive(Debug, Deserialize)]
pub struct ItemsData {
    pub owner: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectOwner {
    #[serde(rename = "projectV2")]
    pub project: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNode {
    pub title: String,
    pub items: ItemConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConnection {
    pub total_count: u64,
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Option<Vec<Option<RawItem>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One project item as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// `None` for redacted items; an empty object for drafts and pull requests
    #[serde(default)]
    pub content: Option<RawContent>,
    #[serde(default)]
    pub field_values: Option<Connection<Option<RawFieldValue>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    pub id: Option<String>,
    pub number: Option<u64>,
    pub title: Option<String>,
    /// `OPEN` or `CLOSED`
    pub state: Option<String>,
    pub url: Option<String>,
    pub updated_at: Option<String>,
    pub milestone: Option<Titled>,
    pub labels: Option<Connection<Option<Named>>>,
    pub assignees: Option<Connection<Option<Login>>>,
    pub repository: Option<RawRepository>,
    pub parent: Option<RawParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub name: Option<String>,
    pub owner: Option<Login>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParent {
    pub id: Option<String>,
}

/// One custom field value. Which properties are set depends on `__typename`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFieldValue {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    pub field: Option<Named>,
    /// Single-select option name
    pub name: Option<String>,
    pub text: Option<String>,
    pub number: Option<f64>,
    pub date: Option<String>,
    /// Iteration title
    pub title: Option<String>,
}

// ── Board discovery ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ViewerData {
    pub viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub login: Option<String>,
    #[serde(default)]
    pub projects_v2: Connection<Option<ProjectSummary>>,
    #[serde(default)]
    pub organizations: Connection<Option<Organization>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub login: Option<String>,
    #[serde(default)]
    pub projects_v2: Connection<Option<ProjectSummary>>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSummary {
    pub title: String,
    pub number: u32,
    pub owner: Option<Login>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_with_empty_content_object() {
        let item: RawItem = serde_json::from_value(serde_json::json!({
            "content": {},
            "fieldValues": { "nodes": [{}, null] }
        }))
        .unwrap();

        let content = item.content.unwrap();
        assert!(content.id.is_none());
        assert_eq!(item.field_values.unwrap().present().count(), 1);
    }

    #[test]
    fn test_errors_array_parses_type() {
        let resp: GraphQlResponse<ItemsData> = serde_json::from_value(serde_json::json!({
            "data": { "owner": null },
            "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to an Organization" }]
        }))
        .unwrap();

        let errors = resp.errors.unwrap();
        assert_eq!(errors[0].kind.as_deref(), Some("NOT_FOUND"));
        assert!(resp.data.unwrap().owner.is_none());
    }
}
