//! Slack incoming-webhook delivery.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use fleetscale_core::{Message, Notifier, PortFuture};

use crate::error::{NotifyError, NotifyResult};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// How a message is presented in the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Note,
    Alert,
}

impl Kind {
    fn username(self) -> &'static str {
        match self {
            Kind::Note => "Note",
            Kind::Alert => "Alert",
        }
    }

    fn icon_emoji(self) -> &'static str {
        match self {
            Kind::Note => ":bulb:",
            Kind::Alert => ":warning:",
        }
    }
}

/// Body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<&'a str>,
    pub text: &'a str,
    pub username: &'static str,
    pub icon_emoji: &'static str,
}

impl<'a> SlackPayload<'a> {
    pub fn new(kind: Kind, message: &'a Message) -> Self {
        Self {
            channel: message.channel.as_deref(),
            text: &message.text,
            username: kind.username(),
            icon_emoji: kind.icon_emoji(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook: String,
}

impl SlackNotifier {
    pub fn new(webhook: impl Into<String>) -> NotifyResult<Self> {
        let http = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            http,
            webhook: webhook.into(),
        })
    }

    pub async fn send(&self, kind: Kind, message: &Message) -> NotifyResult<()> {
        debug!(channel = ?message.channel, ?kind, "posting to slack");
        let response = self
            .http
            .post(&self.webhook)
            .json(&SlackPayload::new(kind, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl Notifier for SlackNotifier {
    fn note<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        Box::pin(async move { Ok(self.send(Kind::Note, message).await?) })
    }

    fn alert<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        Box::pin(async move { Ok(self.send(Kind::Alert, message).await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alert_payload_carries_channel_and_icon() {
        let message = Message::new(Some("#ops"), "Scaling up");
        let value = serde_json::to_value(SlackPayload::new(Kind::Alert, &message)).unwrap();
        assert_eq!(
            value,
            json!({
                "channel": "#ops",
                "text": "Scaling up",
                "username": "Alert",
                "icon_emoji": ":warning:",
            })
        );
    }

    #[test]
    fn note_without_channel_omits_it() {
        let message = Message::new(None, "status");
        let value = serde_json::to_value(SlackPayload::new(Kind::Note, &message)).unwrap();
        assert!(value.get("channel").is_none());
        assert_eq!(value["username"], "Note");
        assert_eq!(value["icon_emoji"], ":bulb:");
    }

    #[tokio::test]
    async fn unreachable_webhook_is_an_error() {
        let slack = SlackNotifier::new("http://127.0.0.1:1/hook").unwrap();
        let err = slack.send(Kind::Alert, &Message::new(None, "x")).await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }
}
