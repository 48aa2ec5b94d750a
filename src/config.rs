use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::{
    cursor::{CursorStore, FileCursor, MemoryCursor},
    notify::{Messenger, Slack, Stdout},
    types::TargetHandle,
};

/// Polling intervals below this risk exhausting the search API rate limit.
pub const MIN_INTERVAL_MINUTES: u32 = 30;

pub const DEFAULT_STATE_FILE: &str = "last_checked.txt";

/// Slack credentials and recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub token: String,
    /// User ID the direct message goes to.
    pub user: String,
}

/// Settings for one run, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub org: String,
    pub target: TargetHandle,
    /// Advisory polling interval; also how far back the first run looks.
    pub interval: Duration,
    pub state_file: PathBuf,
    /// Explicit token; `None` defers to `GH_TOKEN` or the gh CLI.
    pub github_token: Option<String>,
    /// Absent only for dry runs.
    pub slack: Option<SlackConfig>,
    pub dry_run: bool,
}

/// Opens the cursor described by `config`.
///
/// A dry run reads the state file once and keeps any update in memory, so
/// the file on disk is never written.
pub fn build_cursor(config: &Config) -> Box<dyn CursorStore + Send + Sync> {
    let file_cursor = FileCursor::new(&config.state_file, config.interval);
    if config.dry_run {
        Box::new(MemoryCursor::new(file_cursor.load()))
    } else {
        Box::new(file_cursor)
    }
}

/// Picks stdout for dry runs and Slack otherwise.
pub fn build_messenger(config: &Config) -> Result<Box<dyn Messenger + Send + Sync>> {
    if config.dry_run {
        return Ok(Box::new(Stdout));
    }

    let slack = config
        .slack
        .as_ref()
        .context("Slack credentials are required unless --dry-run")?;
    Ok(Box::new(Slack::new(&slack.token, &slack.user)?))
}
