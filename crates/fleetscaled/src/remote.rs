//! Configuration resolution: local file, optionally overlaid by a JSON
//! document served from `remote.url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tracing::{error, info};

use fleetscale_core::AutoscalerConfig;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Deep-merge `overlay` into `base`. Objects merge key by key and arrays
/// index by index, keeping base elements past the end of the overlay. Any
/// other overlay value replaces the base value.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(overlay)) => {
            for (index, value) in overlay.into_iter().enumerate() {
                match base.get_mut(index) {
                    Some(existing) => merge_json(existing, value),
                    None => base.push(value),
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn remote_url(local: &Value) -> Option<&str> {
    local
        .get("remote")
        .and_then(|r| r.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

async fn fetch_remote(url: &str) -> anyhow::Result<Value> {
    let http = reqwest::Client::builder().timeout(REMOTE_TIMEOUT).build()?;
    let response = http.get(url).send().await?.error_for_status()?;
    let value: Value = response.json().await.context("remote config is not JSON")?;
    anyhow::ensure!(value.is_object(), "remote config must be a JSON object");
    Ok(value)
}

/// Load the config at `path`, overlaying the remote document when one is
/// configured. Remote failures are logged and the local config is used.
pub async fn resolve_config(path: &Path) -> anyhow::Result<AutoscalerConfig> {
    let mut value = AutoscalerConfig::load_value(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;

    if let Some(url) = remote_url(&value).map(str::to_string) {
        info!(%url, "getting config from remote");
        match fetch_remote(&url).await {
            Ok(remote) => {
                info!(remote = %remote, "remote options");
                merge_json(&mut value, remote);
            }
            Err(e) => error!(%url, error = %e, "error getting remote options"),
        }
    }

    let config = AutoscalerConfig::from_value(value).context("invalid configuration")?;
    Ok(config)
}

/// Where a daemon reads its configuration from on every pass.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
    /// Forces simulation regardless of the resolved config.
    simulation: bool,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>, simulation: bool) -> Self {
        Self {
            path: path.into(),
            simulation,
        }
    }

    pub async fn resolve(&self) -> anyhow::Result<AutoscalerConfig> {
        let mut config = resolve_config(&self.path).await?;
        config.simulation |= self.simulation;
        Ok(config)
    }
}
