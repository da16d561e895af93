//! Slack notification sink
//!
//! Posts plain-text messages to an incoming-webhook URL. When no URL is
//! configured the notifier is disabled and sends become debug-logged no-ops.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

/// Environment variable for the Slack webhook URL
const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Something that can deliver a notification to a named room
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, room: &str, text: &str) -> Result<()>;
}

pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (no webhook URL configured)");
        }
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a notifier from the SLACK_WEBHOOK_URL environment variable
    pub fn from_env() -> Self {
        Self::new(std::env::var(ENV_SLACK_WEBHOOK_URL).ok())
    }

    pub fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send_message(&self, room: &str, text: &str) -> Result<()> {
        let webhook_url = match &self.webhook_url {
            Some(url) => url,
            None => {
                debug!(room, "Slack disabled, dropping message");
                return Ok(());
            }
        };

        let payload = SlackPayload {
            channel: format!("#{}", room.trim_start_matches('#')),
            text: text.to_string(),
        };

        debug!(room, "Sending Slack notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;

        if response.status().is_success() {
            debug!(room, "Slack notification sent");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(room, status = %status, body = %body, "Slack webhook request failed");

            bail!("Slack returned {status}: {body}")
        }
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload {
    channel: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_notifier_drops_messages() {
        let notifier = SlackNotifier::new(None);
        assert!(!notifier.enabled());

        let result = tokio_test::block_on(notifier.send_message("status-probot", "hello"));
        assert!(result.is_ok());
    }

    #[test]
    fn channel_is_prefixed_once() {
        let payload = SlackPayload {
            channel: format!("#{}", "#status-probot".trim_start_matches('#')),
            text: "hi".to_string(),
        };
        assert_eq!(payload.channel, "#status-probot");

        let payload = SlackPayload {
            channel: format!("#{}", "status-probot".trim_start_matches('#')),
            text: "hi".to_string(),
        };
        assert_eq!(payload.channel, "#status-probot");
    }
}
