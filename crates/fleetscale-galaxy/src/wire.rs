//! Galaxy response shapes and their conversion into fleet snapshots.
//!
//! Galaxy may return a sample more than requested, timestamps as either
//! strings or numbers, and `null` for usage fields it has not collected
//! yet. Missing usage values become NaN so the derived percentages are
//! undefined and fail every check.

use serde::Deserialize;
use serde_json::Value;

use fleetscale_core::{Application, Container, MetricSample, MetricWindow};

use crate::error::{GalaxyError, GalaxyResult};

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
}

impl GraphQlResponse {
    /// The `data` member, or every error message joined with `"; "`.
    pub fn into_data(self) -> GalaxyResult<Value> {
        if !self.errors.is_empty() {
            let messages = self
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GalaxyError::GraphQl(messages));
        }
        self.data.ok_or(GalaxyError::MissingData)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Number(f64),
    Text(String),
}

impl RawTimestamp {
    /// Unix seconds, truncating any fractional part.
    fn seconds(&self) -> GalaxyResult<i64> {
        let value = match self {
            RawTimestamp::Number(n) => *n,
            RawTimestamp::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| GalaxyError::InvalidTimestamp(s.clone()))?,
        };
        if !value.is_finite() {
            return Err(GalaxyError::InvalidTimestamp(value.to_string()));
        }
        Ok(value.trunc() as i64)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSample {
    timestamp: RawTimestamp,
    #[serde(default)]
    cpu: Option<f64>,
    #[serde(default)]
    cpu_cap: Option<f64>,
    #[serde(default)]
    memory: Option<f64>,
    #[serde(default)]
    memory_cap: Option<f64>,
    #[serde(default)]
    connections: Option<f64>,
}

impl RawSample {
    fn into_sample(self) -> GalaxyResult<MetricSample> {
        Ok(MetricSample {
            timestamp: self.timestamp.seconds()?,
            cpu: self.cpu.unwrap_or(f64::NAN),
            cpu_cap: self.cpu_cap.unwrap_or(f64::NAN),
            memory: self.memory.unwrap_or(f64::NAN),
            memory_cap: self.memory_cap.unwrap_or(f64::NAN),
            connections: self.connections.unwrap_or(f64::NAN),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    up: bool,
    #[serde(default)]
    metrics: Vec<RawSample>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    #[serde(rename = "_id")]
    id: String,
    hostname: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    metrics: Vec<RawSample>,
    #[serde(default)]
    containers: Vec<RawContainer>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    app: Option<RawApp>,
}

fn window(raw: Vec<RawSample>, limit: usize) -> GalaxyResult<MetricWindow> {
    let samples = raw
        .into_iter()
        .map(RawSample::into_sample)
        .collect::<GalaxyResult<Vec<_>>>()?;
    Ok(MetricWindow::newest(samples, limit))
}

/// Build an application snapshot from the `data` member of a `getApp`
/// response, keeping at most `limit` samples per window.
pub fn parse_app(data: Value, hostname: &str, limit: usize) -> GalaxyResult<Application> {
    let AppData { app } = serde_json::from_value(data)?;
    let raw = app.ok_or_else(|| GalaxyError::AppNotFound {
        hostname: hostname.to_string(),
    })?;

    let containers = raw
        .containers
        .into_iter()
        .map(|c| {
            Ok(Container {
                id: c.id,
                status: c.status,
                up: c.up,
                metrics: window(c.metrics, limit)?,
            })
        })
        .collect::<GalaxyResult<Vec<_>>>()?;

    Ok(Application {
        id: raw.id,
        hostname: raw.hostname,
        status: raw.status,
        containers,
        metrics: window(raw.metrics, limit)?,
    })
}
