use anyhow::{Context, Result};

use crate::types::*;

pub const REPOSITORIES_PER_PAGE: u32 = 50;
pub const DISCUSSIONS_PER_REPOSITORY: u32 = 20;
pub const COMMENTS_PER_DISCUSSION: u32 = 50;

pub fn create_discussions_query(org: &str, after: Option<&str>) -> serde_json::Value {
    let query = format!(
        r#"
            query($org: String!, $after: String) {{
                organization(login: $org) {{
                    repositories(first: {REPOSITORIES_PER_PAGE}, after: $after) {{
                        pageInfo {{
                            hasNextPage
                            endCursor
                        }}
                        nodes {{
                            name
                            discussions(first: {DISCUSSIONS_PER_REPOSITORY}, orderBy: {{field: UPDATED_AT, direction: DESC}}) {{
                                nodes {{
                                    title
                                    url
                                    author {{
                                        login
                                    }}
                                    comments(first: {COMMENTS_PER_DISCUSSION}) {{
                                        nodes {{
                                            body
                                            createdAt
                                            author {{
                                                login
                                            }}
                                            url
                                        }}
                                    }}
                                }}
                            }}
                        }}
                    }}
                }}
            }}
        "#
    );

    serde_json::json!({
        "query": query,
        "variables": {
            "org": org,
            "after": after,
        }
    })
}

fn author_login(author: Option<GraphQLAuthor>) -> String {
    author
        .map(|a| a.login)
        .unwrap_or_else(|| GHOST_LOGIN.to_string())
}

pub fn convert_comment(comment: GraphQLComment) -> Comment {
    Comment {
        author: author_login(comment.author),
        body: comment.body.unwrap_or_default(),
        created_at: comment.created_at,
        url: comment.url,
    }
}

pub fn convert_discussion(discussion: GraphQLDiscussion) -> Discussion {
    Discussion {
        title: discussion.title,
        url: discussion.url,
        author: author_login(discussion.author),
        comments: discussion
            .comments
            .nodes
            .into_iter()
            .map(convert_comment)
            .collect(),
    }
}

/// Flattens a discussions response into a page, rejecting responses that
/// carry GraphQL errors or no organization.
pub fn convert_discussion_response(response: GraphQLResponse, org: &str) -> Result<DiscussionPage> {
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        anyhow::bail!("GraphQL query failed: {}", messages.join("; "));
    }

    let repositories = response
        .data
        .and_then(|data| data.organization)
        .with_context(|| format!("Organization '{}' not found in GraphQL response", org))?
        .repositories;

    let discussions = repositories
        .nodes
        .into_iter()
        .flat_map(|repo| repo.discussions.nodes)
        .map(convert_discussion)
        .collect();

    Ok(DiscussionPage {
        discussions,
        has_next_page: repositories.page_info.has_next_page,
        end_cursor: repositories.page_info.end_cursor,
    })
}
