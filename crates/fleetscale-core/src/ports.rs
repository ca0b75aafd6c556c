//! Interfaces to the remote fleet service and the notification channel.
//!
//! Both are injected into the engine so decisions can be tested against
//! in-memory implementations. Futures are boxed so the traits stay object
//! safe.

use std::future::Future;
use std::pin::Pin;

use crate::fleet::Application;

/// Boxed future returned by port methods.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Remote orchestration API for one hosting account.
pub trait FleetApi: Send + Sync {
    /// Fetch an application snapshot with at most `limit` samples per window.
    fn fetch_application<'a>(
        &'a self,
        hostname: &'a str,
        series_name: &'a str,
        limit: usize,
    ) -> PortFuture<'a, Application>;

    /// Set the desired number of containers for an application.
    fn set_container_count<'a>(&'a self, app_id: &'a str, container_count: u32)
    -> PortFuture<'a, ()>;

    /// Terminate one container of an application.
    fn kill_container<'a>(&'a self, app_id: &'a str, container_id: &'a str) -> PortFuture<'a, ()>;
}

/// A message for the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Target channel; `None` uses the notifier's default.
    pub channel: Option<String>,
    pub text: String,
}

impl Message {
    pub fn new(channel: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.map(str::to_string),
            text: text.into(),
        }
    }
}

/// Delivers informational notes and threshold alerts.
pub trait Notifier: Send + Sync {
    /// Informational message.
    fn note<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()>;

    /// Threshold breach or fleet mutation.
    fn alert<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()>;
}
