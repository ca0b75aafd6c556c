//! One sync pass and the periodic loop around it.
//!
//! ```text
//! fetch snapshot -> info note -> minimum stats gate -> maxInApp alerts -> autoscale
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use fleetscale_core::{AutoscalerConfig, FleetApi, Notifier};
use fleetscale_engine::alerts::{check_app_alerts, send_info_note};
use fleetscale_engine::{CycleOptions, CycleReport, ScalingController};

use crate::remote::ConfigSource;

/// What a sync pass got to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The application window is shorter than `variables.limit`.
    InsufficientMetrics { have: usize, need: usize },
    Completed { alerts: usize, report: CycleReport },
}

pub struct Syncer {
    /// Last successfully resolved config.
    config: RwLock<AutoscalerConfig>,
    source: Option<ConfigSource>,
    api: Arc<dyn FleetApi>,
    notifier: Arc<dyn Notifier>,
    controller: ScalingController,
}

impl Syncer {
    pub fn new(config: AutoscalerConfig, api: Arc<dyn FleetApi>, notifier: Arc<dyn Notifier>) -> Self {
        let controller = ScalingController::new(api.clone(), notifier.clone());
        Self {
            config: RwLock::new(config),
            source: None,
            api,
            notifier,
            controller,
        }
    }

    /// Re-resolve the config from `source` at the start of every pass.
    ///
    /// The fleet API and notifier keep the endpoints they were built with.
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Config for the next pass. A failed reload keeps the last good one.
    async fn current_config(&self) -> AutoscalerConfig {
        if let Some(source) = &self.source {
            match source.resolve().await {
                Ok(fresh) => {
                    *self.config.write().await = fresh.clone();
                    return fresh;
                }
                Err(e) => warn!(error = %e, "config reload failed, keeping previous config"),
            }
        }
        self.config.read().await.clone()
    }

    /// Run one pass against the configured application.
    pub async fn run_pass(&self) -> anyhow::Result<PassOutcome> {
        let config = self.current_config().await;
        let hostname = &config.variables.hostname;
        info!(%hostname, "starting");
        let result = self.pass(&config).await;
        if let Err(e) = &result {
            error!(%hostname, error = %e, "sync failed");
        }
        info!(%hostname, "finished");
        result
    }

    async fn pass(&self, config: &AutoscalerConfig) -> anyhow::Result<PassOutcome> {
        let vars = &config.variables;
        let app = self
            .api
            .fetch_application(&vars.hostname, &vars.series_name, vars.limit)
            .await?;

        send_info_note(self.notifier.as_ref(), &app, &config.info_rules).await;

        if app.metrics.len() < vars.limit {
            info!(
                need = vars.limit,
                have = app.metrics.len(),
                "minimum stats not available yet"
            );
            return Ok(PassOutcome::InsufficientMetrics {
                have: app.metrics.len(),
                need: vars.limit,
            });
        }

        info!(hostname = %vars.hostname, "checking alerts");
        let alerts = check_app_alerts(self.notifier.as_ref(), &app, &config.alert_rules).await;

        let options = CycleOptions {
            simulation: config.simulation,
        };
        let report = self
            .controller
            .run_cycle(&app, &config.autoscale_rules, options)
            .await?;

        Ok(PassOutcome::Completed { alerts, report })
    }

    /// Run a pass every `interval` until `shutdown` flips. Failed passes
    /// are logged and the loop keeps going.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "sync loop started");

        loop {
            let _ = self.run_pass().await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("sync loop shutting down");
                    break;
                }
            }
        }
    }
}
