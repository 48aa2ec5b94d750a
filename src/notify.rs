//! Delivery of the aggregated notification message.

use std::{fmt::Write as _, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::types::{NotificationEvent, TargetHandle};

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// A transport able to deliver one text message to the configured recipient.
#[async_trait]
pub trait Messenger {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Renders the events as a single Slack-flavoured markdown message.
pub fn format_message(target: &TargetHandle, events: &[NotificationEvent]) -> String {
    let mut message = format!("🚨 *New mention(s) for @{}:*\n", target);
    for event in events {
        let _ = writeln!(message, "- [{}]({})", event.actor, event.url);
    }
    message
}

/// Sends one message listing `events`, or nothing when there are none.
///
/// Returns whether a message was handed to the messenger. Delivery failures
/// are logged and otherwise ignored.
pub async fn notify<M>(messenger: &M, target: &TargetHandle, events: &[NotificationEvent]) -> bool
where
    M: Messenger + Sync + ?Sized,
{
    if events.is_empty() {
        info!("No new mentions");
        return false;
    }

    let message = format_message(target, events);
    info!("Sending {} mention(s) to @{}", events.len(), target);

    if let Err(err) = messenger.send(&message).await {
        error!("Notification send failed: {:#}", err);
    }

    true
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Direct messages through Slack's `chat.postMessage`.
#[derive(Debug, Clone)]
pub struct Slack {
    client: reqwest::Client,
    token: String,
    channel: String,
}

impl Slack {
    /// `channel` is the recipient's user ID; Slack opens the DM itself.
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: token.into(),
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl Messenger for Slack {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = PostMessage {
            channel: &self.channel,
            text,
        };

        let response = self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context("Slack request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Slack response")?;

        check_post_message_response(status, &body)
    }
}

/// Slack signals most failures with HTTP 200 and `"ok": false`.
fn check_post_message_response(status: reqwest::StatusCode, body: &str) -> Result<()> {
    if !status.is_success() {
        anyhow::bail!("Slack returned {}: {}", status, body);
    }

    match serde_json::from_str::<PostMessageResponse>(body) {
        Ok(parsed) if parsed.ok => Ok(()),
        Ok(parsed) => anyhow::bail!(
            "Slack rejected the message: {}",
            parsed.error.unwrap_or_else(|| body.to_string())
        ),
        Err(_) => anyhow::bail!("Unexpected Slack response: {}", body),
    }
}

/// Prints messages instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

#[async_trait]
impl Messenger for Stdout {
    async fn send(&self, text: &str) -> Result<()> {
        print!("{text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_format_message() {
        let events = vec![
            NotificationEvent {
                actor: "bob".to_string(),
                url: "https://github.com/acme/widgets/issues/1#issuecomment-1".to_string(),
            },
            NotificationEvent {
                actor: "carol".to_string(),
                url: "https://github.com/acme/widgets/discussions/2#discussioncomment-3"
                    .to_string(),
            },
        ];

        assert_eq!(
            format_message(&TargetHandle::new("alice"), &events),
            "🚨 *New mention(s) for @alice:*\n\
             - [bob](https://github.com/acme/widgets/issues/1#issuecomment-1)\n\
             - [carol](https://github.com/acme/widgets/discussions/2#discussioncomment-3)\n"
        );
    }

    #[test]
    fn test_slack_ok_response() {
        assert!(check_post_message_response(StatusCode::OK, r#"{"ok":true,"ts":"1.2"}"#).is_ok());
    }

    #[test]
    fn test_slack_not_ok_response() {
        let err = check_post_message_response(
            StatusCode::OK,
            r#"{"ok":false,"error":"channel_not_found"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[test]
    fn test_slack_http_error() {
        let err =
            check_post_message_response(StatusCode::INTERNAL_SERVER_ERROR, "oops").unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_slack_non_json_body() {
        assert!(check_post_message_response(StatusCode::OK, "<html>").is_err());
    }
}
