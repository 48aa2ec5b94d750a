use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    relevance::thread_events,
    types::{Forge, NotificationEvent, TargetHandle},
};

/// Collects notification events from the most recently updated discussions
/// of every repository in the organization.
///
/// Only the discussions each page exposes per repository are inspected;
/// older ones are never reached.
pub async fn fetch_discussion_events<F>(
    forge: &F,
    since: DateTime<Utc>,
    target: &TargetHandle,
) -> Result<Vec<NotificationEvent>>
where
    F: Forge + Sync,
{
    let mut events = Vec::new();
    let mut after: Option<String> = None;
    let mut page_count = 0;

    loop {
        page_count += 1;
        let page = forge
            .discussion_page(after.as_deref())
            .await
            .with_context(|| format!("Failed to fetch discussions (page {page_count})"))?;
        debug!(
            "Discussion page {} returned {} discussions",
            page_count,
            page.discussions.len()
        );

        for discussion in &page.discussions {
            events.extend(thread_events(
                &discussion.author,
                &discussion.comments,
                since,
                target,
            ));
        }

        if !page.has_next_page {
            break;
        }

        after = page.end_cursor;

        // Safety check to prevent infinite loops
        if after.is_none() {
            warn!("Repository page {} has a next page but no cursor", page_count);
            break;
        }
    }

    Ok(events)
}
