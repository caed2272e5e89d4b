//! GraphQL documents sent to GitHub.

use crate::model::OwnerType;

/// Largest page GitHub accepts for `items(first:)`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Board discovery: the viewer's own boards plus boards of their organizations.
pub const VIEWER_BOARDS_QUERY: &str = r"
query {
    viewer {
        login
        projectsV2(first: 50) {
            nodes {
                title
                number
                owner {
                    ... on Organization { login }
                    ... on User { login }
                }
            }
        }
        organizations(first: 20) {
            nodes {
                login
                projectsV2(first: 50) {
                    nodes {
                        title
                        number
                        owner {
                            ... on Organization { login }
                            ... on User { login }
                        }
                    }
                }
            }
        }
    }
}";

/// One page of board items.
///
/// The owner root field differs between user and organization boards; it is
/// aliased to `owner` so both deserialize into the same shape.
#[must_use]
pub fn items_query(owner_type: OwnerType) -> String {
    let root = owner_type.query_field();
    format!(
        r"
query($owner: String!, $number: Int!, $first: Int!, $cursor: String) {{
    owner: {root}(login: $owner) {{
        projectV2(number: $number) {{
            title
            items(first: $first, after: $cursor) {{
                totalCount
                pageInfo {{
                    hasNextPage
                    endCursor
                }}
                nodes {{
                    content {{
                        ... on Issue {{
                            id
                            number
                            title
                            state
                            url
                            updatedAt
                            milestone {{ title }}
                            labels(first: 20) {{ nodes {{ name }} }}
                            assignees(first: 10) {{ nodes {{ login }} }}
                            repository {{
                                name
                                owner {{ login }}
                            }}
                            parent {{ id }}
                        }}
                    }}
                    fieldValues(first: 20) {{
                        nodes {{
                            __typename
                            ... on ProjectV2ItemFieldSingleSelectValue {{
                                field {{ ... on ProjectV2FieldCommon {{ name }} }}
                                name
                            }}
                            ... on ProjectV2ItemFieldTextValue {{
                                field {{ ... on ProjectV2FieldCommon {{ name }} }}
                                text
                            }}
                            ... on ProjectV2ItemFieldDateValue {{
                                field {{ ... on ProjectV2FieldCommon {{ name }} }}
                                date
                            }}
                            ... on ProjectV2ItemFieldNumberValue {{
                                field {{ ... on ProjectV2FieldCommon {{ name }} }}
                                number
                            }}
                            ... on ProjectV2ItemFieldIterationValue {{
                                field {{ ... on ProjectV2FieldCommon {{ name }} }}
                                title
                            }}
                        }}
                    }}
                }}
            }}
        }}
    }}
}}"
    )
}
