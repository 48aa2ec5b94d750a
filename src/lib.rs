//! Pingback: GitHub mention relay.
//!
//! Scans an organization's issues, pull requests and discussions for
//! comments that concern one user (mentions, replies on their own items,
//! replies on threads they joined) and forwards them as a single Slack
//! direct message. A timestamp cursor persisted between runs marks what has
//! already been seen.

pub mod cli;
pub mod config;
pub mod cursor;
pub mod discussions;
pub mod github;
pub mod graphql;
pub mod issues;
pub mod notify;
pub mod relevance;
pub mod run;
pub mod search;
pub mod types;

pub use cli::parse_args;
pub use config::{Config, SlackConfig, build_cursor, build_messenger};
pub use cursor::{CursorStore, FileCursor, MemoryCursor};
pub use discussions::fetch_discussion_events;
pub use github::{GitHub, get_github_token};
pub use issues::{SEARCH_PAGE_SIZE, fetch_item_events};
pub use notify::{Messenger, Slack, Stdout, format_message, notify};
pub use relevance::{is_relevant, thread_events};
pub use run::{RunSummary, run_once};
pub use types::{
    Comment, Discussion, DiscussionPage, Forge, ItemKind, NotificationEvent, TargetHandle,
    TrackedItem,
};
