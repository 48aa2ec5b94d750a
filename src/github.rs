use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Serialize;
use tracing::debug;

use crate::{
    graphql::{convert_discussion_response, create_discussions_query},
    issues::SEARCH_PAGE_SIZE,
    search::build_updated_items_query,
    types::*,
};

/// Comments requested per page when listing an item's comments.
const COMMENTS_PAGE_SIZE: usize = 100;

fn non_blank(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolves a GitHub token, preferring an explicitly configured one.
/// Blank values are skipped.
pub fn get_github_token(configured: Option<&str>) -> Result<String> {
    if let Some(token) = non_blank(configured) {
        return Ok(token);
    }

    if let Some(token) = non_blank(std::env::var("GH_TOKEN").ok().as_deref()) {
        return Ok(token);
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("No GitHub token configured and the gh CLI could not be run")?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

/// Turns an item's API URL into the route listing its comments.
pub fn comments_route(item_url: &str) -> Result<String> {
    let url =
        url::Url::parse(item_url).with_context(|| format!("Failed to parse URL: '{}'", item_url))?;
    Ok(format!("{}/comments", url.path().trim_end_matches('/')))
}

#[derive(Debug, Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: usize,
    page: u32,
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: usize,
    page: u32,
}

fn login_or_ghost(user: Option<RestUser>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| GHOST_LOGIN.to_string())
}

fn convert_rest_comment(comment: RestComment) -> Comment {
    Comment {
        author: login_or_ghost(comment.user),
        body: comment.body.unwrap_or_default(),
        created_at: comment.created_at,
        url: comment.html_url,
    }
}

/// GitHub forge scoped to a single organization.
pub struct GitHub {
    octocrab: Octocrab,
    org: String,
}

impl GitHub {
    pub fn new(token: String, org: impl Into<String>) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            octocrab,
            org: org.into(),
        })
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn search_items(
        &self,
        kind: ItemKind,
        since: DateTime<Utc>,
        page: u32,
    ) -> Result<Vec<TrackedItem>> {
        let query = build_updated_items_query(&self.org, kind, since);
        debug!("Searching '{}' page {}", query, page);

        let params = SearchParams {
            q: &query,
            per_page: SEARCH_PAGE_SIZE,
            page,
        };
        let response: SearchResponse = self.octocrab.get("/search/issues", Some(&params)).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| TrackedItem {
                url: item.url,
                author: login_or_ghost(item.user),
            })
            .collect())
    }

    async fn item_comments(&self, item: &TrackedItem) -> Result<Vec<Comment>> {
        let route = comments_route(&item.url)?;
        let mut comments = Vec::new();
        let mut page = 1;

        loop {
            let params = PageParams {
                per_page: COMMENTS_PAGE_SIZE,
                page,
            };
            let batch: Vec<RestComment> = self.octocrab.get(&route, Some(&params)).await?;
            let batch_len = batch.len();
            comments.extend(batch.into_iter().map(convert_rest_comment));

            if batch_len < COMMENTS_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} comments from {}", comments.len(), route);
        Ok(comments)
    }

    async fn discussion_page(&self, after: Option<&str>) -> Result<DiscussionPage> {
        let query = create_discussions_query(&self.org, after);
        let response: GraphQLResponse = self.octocrab.graphql(&query).await?;
        convert_discussion_response(response, &self.org)
    }
}
