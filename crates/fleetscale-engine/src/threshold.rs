//! Threshold evaluation over a whole metric window.
//!
//! A configured check passes only when every sample in the window is on
//! the configured side of the threshold. Check results are combined with
//! AND or OR to decide whether an action fires.

use tracing::{debug, info, warn};

use fleetscale_core::format::compact_number;
use fleetscale_core::{Action, Check, CombineMode, Direction, MetricField, MetricWindow, RuleSet, ThresholdField};

/// A check that held across the window, with the values that justify it.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub metric: MetricField,
    pub threshold: ThresholdField,
    pub direction: Direction,
    /// Configured threshold.
    pub when_value: f64,
    /// Value of the newest sample, if defined.
    pub last_metric_value: Option<f64>,
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = self
            .last_metric_value
            .map(compact_number)
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "{} {} is {} {} {}",
            self.metric,
            last,
            self.direction.describe(),
            self.threshold,
            compact_number(self.when_value)
        )
    }
}

/// Comma-joined justification for a set of passing checks.
pub fn checks_to_text(results: &[CheckResult]) -> String {
    results
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether every sample satisfies the check.
///
/// A sample whose value is undefined (zero cap) never satisfies it.
fn holds_for_window(check: &Check, threshold: f64, window: &MetricWindow) -> bool {
    window.iter().all(|sample| {
        sample
            .value(check.metric)
            .is_some_and(|value| check.direction.holds(value, threshold))
    })
}

/// Evaluate an action's thresholds against a metric window.
///
/// Returns the passing checks when the action fires, in check-table order.
/// Returns `None` when the window is empty, when nothing is configured for
/// the action, or when the combined result does not fire.
pub fn evaluate(
    action: Action,
    rules: &RuleSet,
    window: &MetricWindow,
    mode: CombineMode,
) -> Option<Vec<CheckResult>> {
    if window.is_empty() {
        warn!(%action, "no metrics available yet");
        return None;
    }

    let configured: Vec<(Check, f64)> = rules
        .thresholds(action)
        .map(|t| t.configured().collect())
        .unwrap_or_default();
    if configured.is_empty() {
        return None;
    }

    let latest = window.latest();
    let passed: Vec<CheckResult> = configured
        .iter()
        .filter_map(|(check, when_value)| {
            let last_metric_value = latest.and_then(|s| s.value(check.metric));
            let held = holds_for_window(check, *when_value, window);
            debug!(
                %action,
                metric = %check.metric,
                last = ?last_metric_value,
                comparison = check.direction.describe(),
                threshold = %check.threshold,
                when = *when_value,
                held,
                "auto-scale check"
            );
            held.then(|| CheckResult {
                metric: check.metric,
                threshold: check.threshold,
                direction: check.direction,
                when_value: *when_value,
                last_metric_value,
            })
        })
        .collect();

    let fires = match mode {
        CombineMode::Or => !passed.is_empty(),
        CombineMode::And => passed.len() == configured.len(),
    };
    info!(%action, ?mode, passed = passed.len(), configured = configured.len(), fires, "auto-scale action evaluated");

    if fires {
        info!("action: {action} {}", checks_to_text(&passed));
        Some(passed)
    } else {
        None
    }
}
