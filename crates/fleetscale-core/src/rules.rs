//! Rule sets and the fixed universe of threshold checks.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::sample::MetricField;

/// Threshold names accepted under `killWhen`, `addWhen` and `reduceWhen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdField {
    CpuPercentageAbove,
    CpuPercentageBelow,
    MemoryPercentageAbove,
    MemoryPercentageBelow,
    ConnectionsAbove,
    ConnectionsBelow,
}

impl ThresholdField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdField::CpuPercentageAbove => "cpuPercentageAbove",
            ThresholdField::CpuPercentageBelow => "cpuPercentageBelow",
            ThresholdField::MemoryPercentageAbove => "memoryPercentageAbove",
            ThresholdField::MemoryPercentageBelow => "memoryPercentageBelow",
            ThresholdField::ConnectionsAbove => "connectionsAbove",
            ThresholdField::ConnectionsBelow => "connectionsBelow",
        }
    }
}

impl std::fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between every sample and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    GreaterThan,
    LessThan,
}

impl Direction {
    /// Strict comparison of `value` against `threshold`.
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::GreaterThan => value > threshold,
            Direction::LessThan => value < threshold,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Direction::GreaterThan => "greater than",
            Direction::LessThan => "less than",
        }
    }
}

/// A metric field, the threshold it is compared to, and the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub metric: MetricField,
    pub threshold: ThresholdField,
    pub direction: Direction,
}

/// Every supported check, in evaluation and reporting order.
pub const CHECKS: [Check; 6] = [
    Check {
        metric: MetricField::CpuPercentage,
        threshold: ThresholdField::CpuPercentageAbove,
        direction: Direction::GreaterThan,
    },
    Check {
        metric: MetricField::CpuPercentage,
        threshold: ThresholdField::CpuPercentageBelow,
        direction: Direction::LessThan,
    },
    Check {
        metric: MetricField::MemoryPercentage,
        threshold: ThresholdField::MemoryPercentageAbove,
        direction: Direction::GreaterThan,
    },
    Check {
        metric: MetricField::MemoryPercentage,
        threshold: ThresholdField::MemoryPercentageBelow,
        direction: Direction::LessThan,
    },
    Check {
        metric: MetricField::Connections,
        threshold: ThresholdField::ConnectionsAbove,
        direction: Direction::GreaterThan,
    },
    Check {
        metric: MetricField::Connections,
        threshold: ThresholdField::ConnectionsBelow,
        direction: Direction::LessThan,
    },
];

/// Threshold values for one action. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Thresholds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percentage_above: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percentage_below: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percentage_above: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percentage_below: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_above: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_below: Option<f64>,
}

impl Thresholds {
    pub fn get(&self, field: ThresholdField) -> Option<f64> {
        match field {
            ThresholdField::CpuPercentageAbove => self.cpu_percentage_above,
            ThresholdField::CpuPercentageBelow => self.cpu_percentage_below,
            ThresholdField::MemoryPercentageAbove => self.memory_percentage_above,
            ThresholdField::MemoryPercentageBelow => self.memory_percentage_below,
            ThresholdField::ConnectionsAbove => self.connections_above,
            ThresholdField::ConnectionsBelow => self.connections_below,
        }
    }

    /// Set a threshold, returning the updated set.
    pub fn with(mut self, field: ThresholdField, value: f64) -> Self {
        let slot = match field {
            ThresholdField::CpuPercentageAbove => &mut self.cpu_percentage_above,
            ThresholdField::CpuPercentageBelow => &mut self.cpu_percentage_below,
            ThresholdField::MemoryPercentageAbove => &mut self.memory_percentage_above,
            ThresholdField::MemoryPercentageBelow => &mut self.memory_percentage_below,
            ThresholdField::ConnectionsAbove => &mut self.connections_above,
            ThresholdField::ConnectionsBelow => &mut self.connections_below,
        };
        *slot = Some(value);
        self
    }

    /// Configured thresholds in check order.
    pub fn configured(&self) -> impl Iterator<Item = (Check, f64)> + '_ {
        CHECKS
            .iter()
            .filter_map(|check| self.get(check.threshold).map(|value| (*check, value)))
    }
}

/// The three actions a rule set can configure thresholds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Kill,
    Add,
    Reduce,
}

impl Action {
    /// Rule-set key holding this action's thresholds.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Kill => "killWhen",
            Action::Add => "addWhen",
            Action::Reduce => "reduceWhen",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the results of several configured checks are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Every configured check must pass.
    And,
    /// At least one configured check must pass.
    Or,
}

fn default_containers_to_scale() -> u32 {
    1
}

/// One block of scaling and kill rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_containers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_containers: Option<u32>,
    #[serde(default = "default_containers_to_scale")]
    pub containers_to_scale: u32,
    /// Combine kill and reduce checks with OR instead of AND.
    #[serde(default, alias = "$or")]
    pub combine_with_or: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_when: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_when: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_when: Option<Thresholds>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            min_containers: None,
            max_containers: None,
            containers_to_scale: default_containers_to_scale(),
            combine_with_or: false,
            channel: None,
            message_prefix: None,
            kill_when: None,
            add_when: None,
            reduce_when: None,
        }
    }
}

impl RuleSet {
    /// Example bounds: at least 2 and at most 10 containers, no thresholds.
    pub fn default_policy() -> Self {
        Self {
            min_containers: Some(2),
            max_containers: Some(10),
            ..Self::default()
        }
    }

    /// Thresholds configured for an action, if any.
    pub fn thresholds(&self, action: Action) -> Option<&Thresholds> {
        match action {
            Action::Kill => self.kill_when.as_ref(),
            Action::Add => self.add_when.as_ref(),
            Action::Reduce => self.reduce_when.as_ref(),
        }
    }

    /// Add checks always use OR; kill and reduce use AND unless
    /// `combineWithOr` is set.
    pub fn combine_mode(&self, action: Action) -> CombineMode {
        match action {
            Action::Add => CombineMode::Or,
            Action::Kill | Action::Reduce if self.combine_with_or => CombineMode::Or,
            Action::Kill | Action::Reduce => CombineMode::And,
        }
    }

    /// Check the rule set for values that can never evaluate sensibly.
    pub fn validate(&self, index: usize) -> ConfigResult<()> {
        if self.containers_to_scale == 0 {
            return Err(ConfigError::invalid_rule(index, "containersToScale must be at least 1"));
        }
        if let (Some(min), Some(max)) = (self.min_containers, self.max_containers)
            && min > max
        {
            return Err(ConfigError::invalid_rule(
                index,
                format!("minContainers ({min}) is greater than maxContainers ({max})"),
            ));
        }
        for action in [Action::Kill, Action::Add, Action::Reduce] {
            let Some(thresholds) = self.thresholds(action) else {
                continue;
            };
            for (check, value) in thresholds.configured() {
                if !value.is_finite() {
                    return Err(ConfigError::invalid_rule(
                        index,
                        format!("{action}.{} must be a finite number", check.threshold),
                    ));
                }
            }
        }
        Ok(())
    }
}
