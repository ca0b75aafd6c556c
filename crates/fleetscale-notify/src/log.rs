use tracing::info;

use fleetscale_core::{Message, Notifier, PortFuture};

/// Why messages are only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogReason {
    /// `silentSlack` is set.
    Silent,
    /// No webhook is configured.
    NoWebhook,
}

impl LogReason {
    fn label(self) -> &'static str {
        match self {
            LogReason::Silent => "silent slack",
            LogReason::NoWebhook => "no slack",
        }
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    reason: LogReason,
}

impl LogNotifier {
    pub fn new(reason: LogReason) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> LogReason {
        self.reason
    }
}

impl Notifier for LogNotifier {
    fn note<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        info!(channel = ?message.channel, "{} - note: {}", self.reason.label(), message.text);
        Box::pin(async { Ok(()) })
    }

    fn alert<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        info!(channel = ?message.channel, "{} - alert: {}", self.reason.label(), message.text);
        Box::pin(async { Ok(()) })
    }
}
