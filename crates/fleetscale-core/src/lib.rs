//! fleetscale-core — shared types for the fleetscale autoscaler.
//!
//! Holds the fleet snapshot model (applications, containers, metric
//! windows), the rule configuration, message formatting helpers, and the
//! port traits the engine uses to reach the fleet API and the notifier.

pub mod config;
pub mod error;
pub mod fleet;
pub mod format;
pub mod ports;
pub mod rules;
pub mod sample;

pub use config::AutoscalerConfig;
pub use error::{ConfigError, ConfigResult};
pub use fleet::*;
pub use ports::{FleetApi, Message, Notifier, PortFuture};
pub use rules::*;
pub use sample::{MetricField, MetricSample, MetricWindow};
