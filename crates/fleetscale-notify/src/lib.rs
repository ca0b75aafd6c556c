//! fleetscale-notify — delivery of notes and alerts.
//!
//! [`AnyNotifier::from_config`] picks the channel:
//!
//! ```text
//! silentSlack = true     => LogNotifier (silent slack)
//! slackWebhook set       => SlackNotifier
//! otherwise              => LogNotifier (no slack)
//! ```

pub mod error;
pub mod log;
pub mod slack;

pub use error::{NotifyError, NotifyResult};
pub use log::{LogNotifier, LogReason};
pub use slack::{Kind, SlackNotifier, SlackPayload};

use fleetscale_core::{AutoscalerConfig, Message, Notifier, PortFuture};

/// Notifier selected from configuration.
#[derive(Debug, Clone)]
pub enum AnyNotifier {
    Slack(SlackNotifier),
    Log(LogNotifier),
}

impl AnyNotifier {
    pub fn from_config(config: &AutoscalerConfig) -> NotifyResult<Self> {
        if config.silent_slack {
            return Ok(Self::Log(LogNotifier::new(LogReason::Silent)));
        }
        match config.slack_webhook.as_deref().filter(|w| !w.is_empty()) {
            Some(webhook) => Ok(Self::Slack(SlackNotifier::new(webhook)?)),
            None => Ok(Self::Log(LogNotifier::new(LogReason::NoWebhook))),
        }
    }
}

impl Notifier for AnyNotifier {
    fn note<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        match self {
            AnyNotifier::Slack(n) => n.note(message),
            AnyNotifier::Log(n) => n.note(message),
        }
    }

    fn alert<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        match self {
            AnyNotifier::Slack(n) => n.alert(message),
            AnyNotifier::Log(n) => n.alert(message),
        }
    }
}
