//! Scaling controller: runs kill and scale decisions against the fleet.
//!
//! Rule sets are processed in declaration order. Within a rule set, kill
//! decisions come first (one container at a time), then at most one
//! scale decision. Every mutation is awaited before the next one is
//! considered; nothing is issued concurrently.
//!
//! Two gates run before any mutation: an application reporting the
//! `updating` status is left alone, and simulation mode logs the action
//! without calling the fleet API.

use std::sync::Arc;

use tracing::{debug, info, warn};

use fleetscale_core::format::{app_link, metrics_text, with_prefix};
use fleetscale_core::{Application, FleetApi, Message, Notifier, RuleSet};

use crate::decider::{kill_decisions, scale_decision, KillDecision, ScaleDecision};
use crate::error::EngineResult;

/// Per-invocation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOptions {
    /// Log decisions without mutating the fleet.
    pub simulation: bool,
}

/// What the controller wanted to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Kill { container_id: String },
    Scale { from: u32, to: u32 },
}

/// What happened to a planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The fleet API call completed.
    Executed,
    /// Simulation mode suppressed the call.
    Simulated,
    /// The application was updating; nothing was called.
    SkippedUpdating,
}

/// One decision taken during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Index of the rule set that produced the decision.
    pub rule_set: usize,
    pub action: PlannedAction,
    pub outcome: Outcome,
    /// Human-readable title, also used in the alert.
    pub title: String,
}

/// Everything a cycle decided, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub actions: Vec<ActionRecord>,
}

impl CycleReport {
    /// Whether at least one mutation reached the fleet API.
    pub fn did_act(&self) -> bool {
        self.actions.iter().any(|a| a.outcome == Outcome::Executed)
    }
}

/// Runs autoscale cycles against a fleet API, alerting through a notifier.
pub struct ScalingController {
    api: Arc<dyn FleetApi>,
    notifier: Arc<dyn Notifier>,
}

impl ScalingController {
    pub fn new(api: Arc<dyn FleetApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Run every rule set against the snapshot and report whether the fleet
    /// was mutated.
    ///
    /// Fails on a missing bound when a threshold decision needs it and on
    /// any fleet API error. Mutations are never retried.
    pub async fn run_autoscale_cycle(
        &self,
        app: &Application,
        rule_sets: &[RuleSet],
        options: CycleOptions,
    ) -> EngineResult<bool> {
        Ok(self.run_cycle(app, rule_sets, options).await?.did_act())
    }

    /// Like [`run_autoscale_cycle`](Self::run_autoscale_cycle), returning
    /// every decision with its outcome.
    pub async fn run_cycle(
        &self,
        app: &Application,
        rule_sets: &[RuleSet],
        options: CycleOptions,
    ) -> EngineResult<CycleReport> {
        let mut report = CycleReport::default();

        for (index, rules) in rule_sets.iter().enumerate() {
            info!(
                app = %app.hostname,
                rule_set = index,
                running = app.running_count(),
                unavailable = app.unavailable_count(),
                status = %app.status,
                "checking auto scaling metrics"
            );

            // Decisions come from the snapshot taken before any kill.
            for kill in kill_decisions(app, rules) {
                let record = self.kill(app, rules, index, &kill, options).await?;
                report.actions.push(record);
            }

            if let Some(decision) = scale_decision(app, rules, index)? {
                let record = self.scale(app, rules, index, &decision, options).await?;
                report.actions.push(record);
            } else {
                debug!(app = %app.hostname, rule_set = index, "no scaling needed");
            }
        }

        Ok(report)
    }

    async fn kill(
        &self,
        app: &Application,
        rules: &RuleSet,
        index: usize,
        kill: &KillDecision,
        options: CycleOptions,
    ) -> EngineResult<ActionRecord> {
        let title = kill.title();
        info!("{title}");

        let outcome = if app.is_updating() {
            info!(
                container = %kill.container_id,
                "skip: should kill container but already scaling from previous actions or updating to a new version"
            );
            Outcome::SkippedUpdating
        } else if options.simulation {
            info!("simulation: Killing {}", kill.container_id);
            Outcome::Simulated
        } else {
            self.api.kill_container(&app.id, &kill.container_id).await?;
            self.send_alert(app, rules, &title).await;
            Outcome::Executed
        };

        Ok(ActionRecord {
            rule_set: index,
            action: PlannedAction::Kill {
                container_id: kill.container_id.clone(),
            },
            outcome,
            title,
        })
    }

    async fn scale(
        &self,
        app: &Application,
        rules: &RuleSet,
        index: usize,
        decision: &ScaleDecision,
        options: CycleOptions,
    ) -> EngineResult<ActionRecord> {
        let title = decision.title();
        info!("{title}");

        let (direction, add_or_remove) = if decision.is_up() {
            ("up", "add")
        } else {
            ("down", "remove")
        };

        let outcome = if app.is_updating() {
            info!(
                "skip: should {add_or_remove} containers but already scaling from previous actions or updating to a new version"
            );
            Outcome::SkippedUpdating
        } else if options.simulation {
            info!("simulation: Scaling {direction} to {}", decision.to);
            Outcome::Simulated
        } else {
            self.api.set_container_count(&app.id, decision.to).await?;
            self.send_alert(app, rules, &title).await;
            Outcome::Executed
        };

        Ok(ActionRecord {
            rule_set: index,
            action: PlannedAction::Scale {
                from: decision.from,
                to: decision.to,
            },
            outcome,
            title,
        })
    }

    /// Delivery failures are logged and never fail the cycle.
    async fn send_alert(&self, app: &Application, rules: &RuleSet, title: &str) {
        let metrics = app.last_metric().map(metrics_text).unwrap_or_default();
        let body = format!(
            "{}\n{title}\n\n*Metrics*\n{metrics}\n",
            app_link(&app.hostname)
        );
        let message = Message::new(
            rules.channel.as_deref(),
            with_prefix(rules.message_prefix.as_deref(), &body),
        );

        info!(channel = ?message.channel, "sending auto scale message");
        if let Err(e) = self.notifier.alert(&message).await {
            warn!(app = %app.hostname, error = %e, "failed to deliver auto scale alert");
        }
    }
}
