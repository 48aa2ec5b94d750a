use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use tracing::info;

use crate::{
    cursor::CursorStore,
    discussions::fetch_discussion_events,
    issues::fetch_item_events,
    notify::{Messenger, notify},
    types::{Forge, ItemKind, NotificationEvent, TargetHandle},
};

/// What a completed run saw and did.
#[derive(Debug)]
pub struct RunSummary {
    pub since: DateTime<Utc>,
    pub events: Vec<NotificationEvent>,
    /// Whether a message was handed to the messenger.
    pub notified: bool,
}

/// Performs one full scan: issues, then pull requests, then discussions.
///
/// The cursor only advances once every source has been read. A failing
/// request returns early, leaving the cursor where it was and sending
/// nothing, so the next run covers the same window again.
pub async fn run_once<F, M, C>(
    forge: &F,
    messenger: &M,
    cursor: &C,
    target: &TargetHandle,
) -> Result<RunSummary>
where
    F: Forge + Sync,
    M: Messenger + Sync + ?Sized,
    C: CursorStore + ?Sized,
{
    let since = cursor.load();
    info!(
        "Checking for mentions since {} ({})",
        since.to_rfc3339(),
        HumanTime::from(since)
    );

    let mut events = Vec::new();
    for kind in [ItemKind::Issue, ItemKind::PullRequest] {
        let found = fetch_item_events(forge, kind, since, target).await?;
        info!("Found {} {} notification(s)", found.len(), kind);
        events.extend(found);
    }

    let found = fetch_discussion_events(forge, since, target).await?;
    info!("Found {} discussion notification(s)", found.len());
    events.extend(found);

    let notified = notify(messenger, target, &events).await;

    let now = Utc::now();
    cursor.save(now)?;
    info!("Advanced cursor to {}", now.to_rfc3339());

    Ok(RunSummary {
        since,
        events,
        notified,
    })
}
