use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Login GitHub reports for comments and items whose author account was
/// deleted.
pub const GHOST_LOGIN: &str = "ghost";

/// The two kinds of tracked item served by the issue search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    /// Value used with the `is:` search qualifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Issue => "issue",
            ItemKind::PullRequest => "pr",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The GitHub login whose notifications are being collected.
///
/// Author comparisons use the login exactly as configured; mention scanning
/// is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle {
    login: String,
    lowered: String,
}

impl TargetHandle {
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        let lowered = login.to_lowercase();
        Self { login, lowered }
    }

    pub fn as_str(&self) -> &str {
        &self.login
    }

    /// Case-sensitive login equality.
    pub fn is(&self, login: &str) -> bool {
        self.login == login
    }

    /// Unanchored, case-insensitive substring search. A short handle such
    /// as `ed` also matches `named`.
    pub fn is_mentioned_in(&self, body: &str) -> bool {
        body.to_lowercase().contains(&self.lowered)
    }
}

impl std::fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.login)
    }
}

/// An issue or pull request returned by the search endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    /// REST API URL of the item; its comments live under `<url>/comments`.
    pub url: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Browser permalink to the comment.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discussion {
    pub title: String,
    pub url: String,
    pub author: String,
    pub comments: Vec<Comment>,
}

/// One page of organization repositories, flattened to their most recently
/// updated discussions.
#[derive(Debug, Clone, Default)]
pub struct DiscussionPage {
    pub discussions: Vec<Discussion>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A single comment worth telling the target about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub actor: String,
    pub url: String,
}

/// Read access to the code forge being watched.
///
/// Every method is a single request (or a single logical listing) and
/// surfaces any non-success response as an error.
#[async_trait]
pub trait Forge {
    /// One page (1-based) of items of `kind` updated after `since`.
    async fn search_items(
        &self,
        kind: ItemKind,
        since: DateTime<Utc>,
        page: u32,
    ) -> Result<Vec<TrackedItem>>;

    /// Every comment on `item`, oldest first.
    async fn item_comments(&self, item: &TrackedItem) -> Result<Vec<Comment>>;

    /// One page of repositories and their discussions, starting after
    /// `after` (`None` for the first page).
    async fn discussion_page(&self, after: Option<&str>) -> Result<DiscussionPage>;
}

#[derive(Debug, Deserialize)]
pub struct RestUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RestIssue>,
}

#[derive(Debug, Deserialize)]
pub struct RestIssue {
    pub url: String,
    pub user: Option<RestUser>,
}

#[derive(Debug, Deserialize)]
pub struct RestComment {
    pub user: Option<RestUser>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse {
    pub data: Option<DiscussionData>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscussionData {
    pub organization: Option<GraphQLOrganization>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLOrganization {
    pub repositories: GraphQLRepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRepositoryConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<GraphQLRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLRepository {
    pub name: String,
    pub discussions: GraphQLDiscussionConnection,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLDiscussionConnection {
    pub nodes: Vec<GraphQLDiscussion>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLDiscussion {
    pub title: String,
    pub url: String,
    pub author: Option<GraphQLAuthor>,
    pub comments: GraphQLCommentConnection,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLAuthor {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLCommentConnection {
    pub nodes: Vec<GraphQLComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLComment {
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Option<GraphQLAuthor>,
    pub url: String,
}
