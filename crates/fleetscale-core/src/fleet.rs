//! Fleet snapshot types: an application and its containers.
//!
//! A snapshot is built once per pass from the remote service and never
//! mutated afterwards. Running and unavailable counts are derived from the
//! container list.

use serde::{Deserialize, Serialize};

use crate::sample::{MetricSample, MetricWindow};

/// Application status reported while a deploy or scaling operation is in flight.
pub const STATUS_UPDATING: &str = "updating";

/// Unique identifier for an application.
pub type AppId = String;

/// Unique identifier for a container.
pub type ContainerId = String;

// ── Container ─────────────────────────────────────────────────────

/// One container of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub status: String,
    pub up: bool,
    /// Container metrics, newest first.
    pub metrics: MetricWindow,
}

impl Container {
    pub fn last_metric(&self) -> Option<&MetricSample> {
        self.metrics.latest()
    }
}

// ── Application ───────────────────────────────────────────────────

/// Application snapshot as seen at the start of a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: AppId,
    pub hostname: String,
    pub status: String,
    pub containers: Vec<Container>,
    /// Application-wide metrics, newest first.
    pub metrics: MetricWindow,
}

impl Application {
    /// Number of containers reporting `up`.
    pub fn running_count(&self) -> u32 {
        self.containers.iter().filter(|c| c.up).count() as u32
    }

    /// Number of containers not reporting `up`.
    pub fn unavailable_count(&self) -> u32 {
        self.containers.iter().filter(|c| !c.up).count() as u32
    }

    pub fn last_metric(&self) -> Option<&MetricSample> {
        self.metrics.latest()
    }

    /// Latest connection count spread over the running containers, or `None`
    /// with no running container or no latest sample.
    pub fn connections_by_container(&self) -> Option<f64> {
        let running = self.running_count();
        let connections = self.last_metric()?.connections;
        (running > 0 && connections.is_finite()).then(|| connections / f64::from(running))
    }

    /// Whether an update or earlier scaling operation is still in flight.
    pub fn is_updating(&self) -> bool {
        self.status == STATUS_UPDATING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(id: &str, up: bool) -> Container {
        Container {
            id: id.to_string(),
            status: if up { "running" } else { "stopped" }.to_string(),
            up,
            metrics: MetricWindow::default(),
        }
    }

    #[test]
    fn counts_follow_container_list() {
        let mut app = Application {
            id: "app-1".to_string(),
            hostname: "shop.example.com".to_string(),
            status: "running".to_string(),
            containers: vec![container("a", true), container("b", false), container("c", true)],
            metrics: MetricWindow::default(),
        };
        assert_eq!(app.running_count(), 2);
        assert_eq!(app.unavailable_count(), 1);

        app.containers.pop();
        assert_eq!(app.running_count(), 1);
        assert_eq!(app.unavailable_count(), 1);
    }

    #[test]
    fn updating_status() {
        let app = Application {
            id: "app-1".to_string(),
            hostname: "shop.example.com".to_string(),
            status: STATUS_UPDATING.to_string(),
            containers: Vec::new(),
            metrics: MetricWindow::default(),
        };
        assert!(app.is_updating());
        assert!(app.last_metric().is_none());
        assert!(app.connections_by_container().is_none());
    }

    #[test]
    fn connections_spread_over_running_containers() {
        let sample = MetricSample {
            timestamp: 1_600_000_000,
            cpu: 0.5,
            cpu_cap: 1.0,
            memory: 128.0,
            memory_cap: 512.0,
            connections: 90.0,
        };
        let mut app = Application {
            id: "app-1".to_string(),
            hostname: "shop.example.com".to_string(),
            status: "running".to_string(),
            containers: vec![container("a", true), container("b", false), container("c", true)],
            metrics: MetricWindow::newest(vec![sample], 5),
        };
        assert_eq!(app.connections_by_container(), Some(45.0));

        for c in &mut app.containers {
            c.up = false;
        }
        assert_eq!(app.connections_by_container(), None);
    }
}
