use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    relevance::thread_events,
    types::{Forge, ItemKind, NotificationEvent, TargetHandle},
};

/// Number of items requested per search page. A shorter page is the last.
pub const SEARCH_PAGE_SIZE: usize = 50;

/// Collects notification events from issues or pull requests updated after
/// `since`.
///
/// Every search page is read before any comments are fetched. The first
/// failing request aborts the whole scan.
pub async fn fetch_item_events<F>(
    forge: &F,
    kind: ItemKind,
    since: DateTime<Utc>,
    target: &TargetHandle,
) -> Result<Vec<NotificationEvent>>
where
    F: Forge + Sync,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = forge
            .search_items(kind, since, page)
            .await
            .with_context(|| format!("Failed to search {kind} items (page {page})"))?;
        let batch_len = batch.len();
        debug!("Search page {} returned {} {} items", page, batch_len, kind);
        items.extend(batch);

        if batch_len < SEARCH_PAGE_SIZE {
            break;
        }
        page += 1;
    }

    let mut events = Vec::new();
    for item in &items {
        let comments = forge
            .item_comments(item)
            .await
            .with_context(|| format!("Failed to fetch comments for {}", item.url))?;
        events.extend(thread_events(&item.author, &comments, since, target));
    }

    Ok(events)
}
