//! Metric samples and the newest-first metric window.
//!
//! The remote service reports raw usage (`cpu`, `cpuCap`, `memory`,
//! `memoryCap`, `connections`) per sample. Percentages are derived on
//! demand and are undefined when the corresponding cap is zero.

use serde::{Deserialize, Serialize};

/// Metric fields a check or alert rule can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    CpuPercentage,
    MemoryPercentage,
    Connections,
}

impl MetricField {
    pub const ALL: [MetricField; 3] = [
        MetricField::CpuPercentage,
        MetricField::MemoryPercentage,
        MetricField::Connections,
    ];

    /// Field name as it appears in configuration and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::CpuPercentage => "cpuPercentage",
            MetricField::MemoryPercentage => "memoryPercentage",
            MetricField::Connections => "connections",
        }
    }

    pub fn is_percentage(&self) -> bool {
        !matches!(self, MetricField::Connections)
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single point-in-time usage sample for an application or container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub cpu: f64,
    pub cpu_cap: f64,
    pub memory: f64,
    pub memory_cap: f64,
    pub connections: f64,
}

impl MetricSample {
    /// `cpu / cpuCap * 100`, or `None` when the cap is zero.
    pub fn cpu_percentage(&self) -> Option<f64> {
        percentage(self.cpu, self.cpu_cap)
    }

    /// `memory / memoryCap * 100`, or `None` when the cap is zero.
    pub fn memory_percentage(&self) -> Option<f64> {
        percentage(self.memory, self.memory_cap)
    }

    /// Read a metric field. Undefined derived values come back as `None`.
    pub fn value(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::CpuPercentage => self.cpu_percentage(),
            MetricField::MemoryPercentage => self.memory_percentage(),
            MetricField::Connections => Some(self.connections).filter(|v| v.is_finite()),
        }
    }
}

fn percentage(value: f64, cap: f64) -> Option<f64> {
    if cap == 0.0 || !cap.is_finite() || !value.is_finite() {
        return None;
    }
    Some(value / cap * 100.0)
}

/// Time-ordered samples, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricWindow(Vec<MetricSample>);

impl MetricWindow {
    /// Build a window from samples already ordered newest first.
    pub fn from_ordered(samples: Vec<MetricSample>) -> Self {
        Self(samples)
    }

    /// Build a window holding at most `limit` samples.
    ///
    /// Samples are sorted newest first and the oldest excess is dropped.
    /// The transport over-fetches by one, so this is where the window
    /// gets its final size.
    pub fn newest(mut samples: Vec<MetricSample>, limit: usize) -> Self {
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        samples.truncate(limit);
        Self(samples)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&MetricSample> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricSample> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a MetricWindow {
    type Item = &'a MetricSample;
    type IntoIter = std::slice::Iter<'a, MetricSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
