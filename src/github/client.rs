//! GitHub GraphQL client.
//!
//! Talks to `https://api.github.com/graphql` (or a configured endpoint)
//! with a bearer token. Implements [`ItemSource`] for board items and
//! provides board discovery for the viewer.

use crate::error::{Error, Result};
use crate::model::{BoardRef, OwnerType};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::queries::{MAX_PAGE_SIZE, VIEWER_BOARDS_QUERY, items_query};
use super::source::{ItemPage, ItemSource};
use super::types::{GraphQlError, GraphQlRequest, GraphQlResponse, ItemsData, ViewerData};

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Longest error body echoed back in messages.
const MAX_BODY_IN_ERROR: usize = 200;

/// GitHub GraphQL client.
pub struct GitHubClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    page_size: u32,
}

#[derive(Debug, Serialize)]
struct ItemsVariables<'a> {
    owner: &'a str,
    number: u32,
    first: u32,
    cursor: Option<&'a str>,
}

impl GitHubClient {
    /// Create a client for `token`.
    ///
    /// `endpoint` defaults to [`DEFAULT_ENDPOINT`]; `page_size` defaults to
    /// and is capped at 100.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(token: String, endpoint: Option<String>, page_size: Option<u32>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("board-pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            token,
            page_size: page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// List every board the token's owner can see.
    ///
    /// # Errors
    ///
    /// Returns transport errors, or a protocol error if GitHub answered with
    /// an `errors` payload.
    pub async fn list_boards(&self) -> Result<Vec<BoardRef>> {
        let request = GraphQlRequest::<()> {
            query: VIEWER_BOARDS_QUERY,
            variables: None,
        };
        let response: GraphQlResponse<ViewerData> = self.post(&request).await?;
        boards_from_response(response)
    }

    async fn post<V, T>(&self, request: &GraphQlRequest<'_, V>) -> Result<GraphQlResponse<T>>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::PermissionDenied(
                "GitHub rejected the token (HTTP 401)".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate(&body, MAX_BODY_IN_ERROR);
            if status == StatusCode::FORBIDDEN {
                return Err(Error::PermissionDenied(format!("HTTP 403: {body}")));
            }
            return Err(Error::Transport(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("Failed to parse GitHub response: {e}")))
    }
}

impl ItemSource for GitHubClient {
    async fn fetch_page(&self, board: &BoardRef, cursor: Option<&str>) -> Result<ItemPage> {
        let query = items_query(board.owner_type);
        let request = GraphQlRequest {
            query: &query,
            variables: Some(ItemsVariables {
                owner: &board.owner,
                number: board.number,
                first: self.page_size,
                cursor,
            }),
        };

        debug!(owner = %board.owner, number = board.number, ?cursor, "Requesting item page");
        let response: GraphQlResponse<ItemsData> = self.post(&request).await?;
        page_from_response(response, board)
    }
}

/// Turn an items response into a page, mapping error payloads.
///
/// # Errors
///
/// Returns [`Error::BoardNotFound`] when the owner or project resolves to
/// null, otherwise the classified first GraphQL error.
pub fn page_from_response(
    response: GraphQlResponse<ItemsData>,
    board: &BoardRef,
) -> Result<ItemPage> {
    if let Some(errors) = response.errors.as_deref().filter(|e| !e.is_empty()) {
        return Err(classify_errors(errors, Some(board)));
    }

    let project = response
        .data
        .and_then(|d| d.owner)
        .and_then(|o| o.project)
        .ok_or_else(|| Error::BoardNotFound {
            owner: board.owner.clone(),
            number: board.number,
        })?;

    let items = project.items;
    Ok(ItemPage {
        board_title: project.title,
        total_count: items.total_count,
        items: items.nodes.into_iter().flatten().flatten().collect(),
        has_next_page: items.page_info.has_next_page,
        end_cursor: items.page_info.end_cursor,
    })
}

/// Turn a viewer response into board references.
///
/// # Errors
///
/// Returns the classified first GraphQL error, or a protocol error when the
/// response has no data.
pub fn boards_from_response(response: GraphQlResponse<ViewerData>) -> Result<Vec<BoardRef>> {
    if let Some(errors) = response.errors.as_deref().filter(|e| !e.is_empty()) {
        return Err(classify_errors(errors, None));
    }

    let viewer = response
        .data
        .map(|d| d.viewer)
        .ok_or_else(|| Error::Protocol("Board listing returned no data".to_string()))?;

    let viewer_login = viewer.login.clone().unwrap_or_default();
    let mut boards = Vec::new();

    for project in viewer.projects_v2.into_present() {
        let owner = project
            .owner
            .and_then(|o| o.login)
            .unwrap_or_else(|| viewer_login.clone());
        boards.push(BoardRef {
            title: project.title,
            number: project.number,
            owner,
            owner_type: OwnerType::User,
        });
    }

    for org in viewer.organizations.into_present() {
        let org_login = org.login.unwrap_or_default();
        for project in org.projects_v2.into_present() {
            let owner = project
                .owner
                .and_then(|o| o.login)
                .unwrap_or_else(|| org_login.clone());
            boards.push(BoardRef {
                title: project.title,
                number: project.number,
                owner,
                owner_type: OwnerType::Organization,
            });
        }
    }

    Ok(boards)
}

/// Map the first GraphQL error onto the error taxonomy.
fn classify_errors(errors: &[GraphQlError], board: Option<&BoardRef>) -> Error {
    let Some(first) = errors.first() else {
        return Error::Protocol("GitHub returned an empty error list".to_string());
    };

    match (first.kind.as_deref(), board) {
        (Some("NOT_FOUND"), Some(board)) => Error::BoardNotFound {
            owner: board.owner.clone(),
            number: board.number,
        },
        (Some("FORBIDDEN" | "INSUFFICIENT_SCOPES"), _) => {
            Error::PermissionDenied(first.message.clone())
        }
        _ => Error::Protocol(first.message.clone()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board() -> BoardRef {
        BoardRef {
            title: "Roadmap".into(),
            number: 5,
            owner: "acme".into(),
            owner_type: OwnerType::Organization,
        }
    }

    #[test]
    fn test_page_from_response() {
        let response = serde_json::from_value(json!({
            "data": { "owner": { "projectV2": {
                "title": "Roadmap Q3",
                "items": {
                    "totalCount": 250,
                    "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29yOjEwMA==" },
                    "nodes": [
                        { "content": { "id": "I_1", "url": "https://github.com/acme/api/issues/1" } },
                        null,
                        { "content": {} }
                    ]
                }
            }}}
        }))
        .unwrap();

        let page = page_from_response(response, &board()).unwrap();
        assert_eq!(page.board_title, "Roadmap Q3");
        assert_eq!(page.total_count, 250);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("Y3Vyc29yOjEwMA=="));
    }

    #[test]
    fn test_null_project_is_board_not_found() {
        let response = serde_json::from_value(json!({
            "data": { "owner": { "projectV2": null } }
        }))
        .unwrap();

        let err = page_from_response(response, &board()).unwrap_err();
        assert!(matches!(err, Error::BoardNotFound { number: 5, .. }));
    }

    #[test]
    fn test_error_payload_classification() {
        let not_found = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a ProjectV2" }]
        }))
        .unwrap();
        assert!(matches!(
            page_from_response(not_found, &board()),
            Err(Error::BoardNotFound { .. })
        ));

        let forbidden = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "type": "INSUFFICIENT_SCOPES", "message": "read:project required" }]
        }))
        .unwrap();
        assert!(matches!(
            page_from_response(forbidden, &board()),
            Err(Error::PermissionDenied(_))
        ));

        let other = serde_json::from_value(json!({
            "errors": [{ "message": "Something went wrong" }]
        }))
        .unwrap();
        match page_from_response(other, &board()) {
            Err(Error::Protocol(msg)) => assert_eq!(msg, "Something went wrong"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_boards_from_response() {
        let response = serde_json::from_value(json!({
            "data": { "viewer": {
                "login": "octocat",
                "projectsV2": { "nodes": [
                    { "title": "Personal", "number": 1, "owner": { "login": "octocat" } }
                ]},
                "organizations": { "nodes": [
                    { "login": "acme", "projectsV2": { "nodes": [
                        { "title": "Roadmap", "number": 5, "owner": { "login": "acme" } },
                        { "title": "Ops", "number": 6, "owner": null }
                    ]}}
                ]}
            }}
        }))
        .unwrap();

        let boards = boards_from_response(response).unwrap();
        assert_eq!(boards.len(), 3);
        assert_eq!(boards[0].owner_type, OwnerType::User);
        assert_eq!(boards[1].owner, "acme");
        assert_eq!(boards[2].owner, "acme");
        assert_eq!(boards[2].owner_type, OwnerType::Organization);
    }

    #[test]
    fn test_page_size_is_capped() {
        let client = GitHubClient::new("t".into(), None, Some(500)).unwrap();
        assert_eq!(client.page_size(), 100);
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);

        let client = GitHubClient::new("t".into(), None, Some(0)).unwrap();
        assert_eq!(client.page_size(), 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
