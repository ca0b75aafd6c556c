//! Kill and scale decisions for one rule set.
//!
//! Both deciders are pure: they read the snapshot taken at the start of
//! the pass and never look at the outcome of other decisions.

use tracing::{debug, info};

use fleetscale_core::{Action, Application, ContainerId, RuleSet};

use crate::error::{EngineError, EngineResult};
use crate::threshold::{checks_to_text, evaluate, CheckResult};

/// A container selected for termination.
#[derive(Debug, Clone, PartialEq)]
pub struct KillDecision {
    pub container_id: ContainerId,
    pub checks: Vec<CheckResult>,
}

impl KillDecision {
    pub fn title(&self) -> String {
        format!("Killing {}: {}", self.container_id, checks_to_text(&self.checks))
    }
}

/// Select containers whose own metric window satisfies `killWhen`.
pub fn kill_decisions(app: &Application, rules: &RuleSet) -> Vec<KillDecision> {
    if rules.kill_when.is_none() {
        return Vec::new();
    }
    let mode = rules.combine_mode(Action::Kill);
    app.containers
        .iter()
        .filter_map(|container| {
            debug!(container = %container.id, up = container.up, "checking kill rules");
            evaluate(Action::Kill, rules, &container.metrics, mode).map(|checks| KillDecision {
                container_id: container.id.clone(),
                checks,
            })
        })
        .collect()
}

/// Why the container count should change.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleReason {
    BelowMinimum,
    AboveMaximum,
    Thresholds(Vec<CheckResult>),
}

/// A change of the application's container count.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDecision {
    /// Running containers when the decision was made.
    pub from: u32,
    /// Target container count.
    pub to: u32,
    pub reason: ScaleReason,
}

impl ScaleDecision {
    pub fn is_up(&self) -> bool {
        self.to > self.from
    }

    /// Number of containers added or removed.
    pub fn delta(&self) -> u32 {
        self.to.abs_diff(self.from)
    }

    pub fn reason_text(&self) -> String {
        match &self.reason {
            ScaleReason::BelowMinimum => {
                format!("Below minimum of containers, adding {}", self.delta())
            }
            ScaleReason::AboveMaximum => {
                format!("Above maximum of containers, reducing {}", self.delta())
            }
            ScaleReason::Thresholds(checks) => checks_to_text(checks),
        }
    }

    /// `Scaling up containers to *4* from 3 (1 more): <reason>`.
    pub fn title(&self) -> String {
        let (direction, more_or_less) = if self.is_up() {
            ("up", "more")
        } else {
            ("down", "less")
        };
        format!(
            "Scaling {direction} containers to *{}* from {} ({} {more_or_less}): {}",
            self.to,
            self.from,
            self.delta(),
            self.reason_text()
        )
    }
}

/// Containers to add or remove: the configured step, or a single
/// container when the step would cross the bound `gap` away.
fn step(containers_to_scale: u32, gap: u32) -> u32 {
    if containers_to_scale > gap { 1 } else { containers_to_scale.max(1) }
}

/// Decide the container count for one rule set. First match wins:
/// minimum bound, maximum bound, add thresholds, reduce thresholds.
///
/// `index` identifies the rule set in configuration errors.
pub fn scale_decision(
    app: &Application,
    rules: &RuleSet,
    index: usize,
) -> EngineResult<Option<ScaleDecision>> {
    let running = app.running_count();

    if let Some(min) = rules.min_containers
        && running < min
    {
        info!("action: addingToMinimum: below minimum of containers, adding {}", min - running);
        return Ok(Some(ScaleDecision {
            from: running,
            to: min,
            reason: ScaleReason::BelowMinimum,
        }));
    }

    if let Some(max) = rules.max_containers
        && running > max
    {
        info!("action: reducingToMaximum: above maximum of containers, reducing {}", running - max);
        return Ok(Some(ScaleDecision {
            from: running,
            to: max,
            reason: ScaleReason::AboveMaximum,
        }));
    }

    if let Some(checks) = evaluate(Action::Add, rules, &app.metrics, rules.combine_mode(Action::Add)) {
        let max = rules
            .max_containers
            .ok_or(EngineError::MissingMaxContainers { index })?;
        if running < max {
            let delta = step(rules.containers_to_scale, max - running);
            return Ok(Some(ScaleDecision {
                from: running,
                to: running + delta,
                reason: ScaleReason::Thresholds(checks),
            }));
        }
        debug!(running, max, "add thresholds hold but already at maximum");
    }

    if let Some(checks) = evaluate(
        Action::Reduce,
        rules,
        &app.metrics,
        rules.combine_mode(Action::Reduce),
    ) {
        let min = rules
            .min_containers
            .ok_or(EngineError::MissingMinContainers { index })?;
        if running > min {
            let delta = step(rules.containers_to_scale, running - min);
            return Ok(Some(ScaleDecision {
                from: running,
                to: running - delta,
                reason: ScaleReason::Thresholds(checks),
            }));
        }
        debug!(running, min, "reduce thresholds hold but already at minimum");
    }

    Ok(None)
}
