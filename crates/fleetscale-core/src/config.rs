//! Autoscaler configuration parser.
//!
//! Configuration is read from TOML or JSON (chosen by file extension) into a
//! loosely-typed value first, so a remote overlay can be merged over it
//! before the typed structure is built and validated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::rules::{RuleSet, ThresholdField, Thresholds};
use crate::sample::MetricField;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalerConfig {
    /// GraphQL endpoint of the hosting service.
    pub galaxy_url: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,
    /// Log Slack messages instead of delivering them.
    #[serde(default)]
    pub silent_slack: bool,
    /// Compute and log decisions without mutating the fleet.
    #[serde(default)]
    pub simulation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    pub variables: Variables,
    #[serde(default)]
    pub info_rules: InfoRules,
    #[serde(default)]
    pub alert_rules: AlertRules,
    #[serde(default)]
    pub autoscale_rules: Vec<RuleSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// URL returning a JSON document merged over the local config.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variables {
    pub hostname: String,
    #[serde(default = "default_series_name")]
    pub series_name: String,
    /// Number of samples in every metric window.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_series_name() -> String {
    "5m".to_string()
}

fn default_limit() -> usize {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRules {
    /// Send an informational note on every pass.
    #[serde(default)]
    pub send: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRules {
    /// Alert when every application sample exceeds the given value.
    #[serde(default)]
    pub max_in_app: BTreeMap<MetricField, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_prefix: Option<String>,
}

/// Parse TOML into a JSON value. JSON has no NaN or infinity, so a
/// non-finite float is an error instead of a silent `null`.
fn toml_to_json(content: &str) -> ConfigResult<serde_json::Value> {
    let table: toml::Table = toml::from_str(content)?;
    for (key, value) in &table {
        reject_non_finite(key, value)?;
    }
    Ok(serde_json::to_value(table)?)
}

fn reject_non_finite(path: &str, value: &toml::Value) -> ConfigResult<()> {
    match value {
        toml::Value::Float(f) if !f.is_finite() => Err(ConfigError::Invalid(format!(
            "{path} must be a finite number, got {f}"
        ))),
        toml::Value::Table(table) => table
            .iter()
            .try_for_each(|(key, value)| reject_non_finite(&format!("{path}.{key}"), value)),
        toml::Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, value)| reject_non_finite(&format!("{path}[{i}]"), value)),
        _ => Ok(()),
    }
}

impl AutoscalerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        Self::from_value(Self::load_value(path)?)
    }

    /// Read a config file into an untyped JSON value.
    pub fn load_value(path: &Path) -> ConfigResult<serde_json::Value> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            toml_to_json(&content)
        }
    }

    /// Build a validated config from an untyped value.
    pub fn from_value(value: serde_json::Value) -> ConfigResult<Self> {
        let config: AutoscalerConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.galaxy_url.trim().is_empty() {
            return Err(ConfigError::Invalid("galaxyUrl must not be empty".to_string()));
        }
        if self.variables.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "variables.hostname must not be empty".to_string(),
            ));
        }
        if self.variables.limit == 0 {
            return Err(ConfigError::Invalid(
                "variables.limit must be at least 1".to_string(),
            ));
        }
        for (metric, max) in &self.alert_rules.max_in_app {
            if !max.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "alertRules.maxInApp.{metric} must be a finite number"
                )));
            }
        }
        for (index, rules) in self.autoscale_rules.iter().enumerate() {
            rules.validate(index)?;
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a starter config for the given application hostname.
    pub fn scaffold(hostname: &str) -> Self {
        AutoscalerConfig {
            galaxy_url: "https://us-east-1.api.meteor.com/graphql".to_string(),
            api_key: "REPLACE_ME".to_string(),
            slack_webhook: None,
            silent_slack: false,
            simulation: true,
            remote: None,
            variables: Variables {
                hostname: hostname.to_string(),
                series_name: default_series_name(),
                limit: default_limit(),
            },
            info_rules: InfoRules::default(),
            alert_rules: AlertRules {
                max_in_app: BTreeMap::from([(MetricField::CpuPercentage, 90.0)]),
                channel: None,
                message_prefix: None,
            },
            autoscale_rules: vec![RuleSet {
                containers_to_scale: 1,
                kill_when: Some(
                    Thresholds::default().with(ThresholdField::MemoryPercentageAbove, 95.0),
                ),
                add_when: Some(
                    Thresholds::default()
                        .with(ThresholdField::CpuPercentageAbove, 75.0)
                        .with(ThresholdField::MemoryPercentageAbove, 85.0),
                ),
                reduce_when: Some(
                    Thresholds::default().with(ThresholdField::CpuPercentageBelow, 25.0),
                ),
                ..RuleSet::default_policy()
            }],
        }
    }
}
