//! Text formatting for Slack-style messages.

use crate::fleet::Application;
use crate::sample::{MetricField, MetricSample};

/// Containers page of an application on Galaxy.
pub fn galaxy_url(hostname: &str) -> String {
    format!("https://galaxy.meteor.com/app/{hostname}/containers")
}

/// `"<hostname> - <url|see on Galaxy>"` in Slack link syntax.
pub fn app_link(hostname: &str) -> String {
    format!("{hostname} - <{}|see on Galaxy>", galaxy_url(hostname))
}

/// Slack date token that renders in the reader's timezone.
pub fn slack_timestamp(timestamp: i64) -> String {
    format!("<!date^{timestamp}^{{date_short_pretty}} at {{time_secs}}|{timestamp}>")
}

/// Compact number: one decimal at most, trailing `.0` dropped.
///
/// `90.0` renders as `90`, `85.55` as `85.6`.
pub fn compact_number(value: f64) -> String {
    let rendered = format!("{value:.1}");
    match rendered.strip_suffix(".0") {
        Some(whole) if whole != "-0" => whole.to_string(),
        Some(_) => "0".to_string(),
        None => rendered,
    }
}

/// Render a metric value for listings: percentages get one decimal and `%`.
pub fn metric_value(field: MetricField, value: f64) -> String {
    if field.is_percentage() {
        format!("{value:.1}%")
    } else {
        compact_number(value)
    }
}

/// One `*field*\nvalue` block per defined metric of a sample.
pub fn metrics_text(sample: &MetricSample) -> String {
    MetricField::ALL
        .iter()
        .filter_map(|field| {
            sample
                .value(*field)
                .map(|value| format!("*{field}*\n{}", metric_value(*field, value)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `field: value` lines for a sample, used in alert bodies.
pub fn metrics_lines(sample: &MetricSample) -> String {
    MetricField::ALL
        .iter()
        .filter_map(|field| {
            sample
                .value(*field)
                .map(|value| format!("{field}: {}", metric_value(*field, value)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Latest application metrics plus `connectionsByContainer` when defined.
pub fn app_metrics_lines(app: &Application) -> String {
    let mut lines = app.last_metric().map(metrics_lines).unwrap_or_default();
    if let Some(per_container) = app.connections_by_container() {
        if !lines.is_empty() {
            lines.push('\n');
        }
        lines.push_str(&format!("connectionsByContainer: {}", compact_number(per_container)));
    }
    lines
}

/// Container and status summary of an application.
pub fn fleet_lines(app: &Application) -> String {
    [
        format!("hostname: {}", app.hostname),
        format!("status: {}", app.status),
        format!("containerCount: {}", app.containers.len()),
        format!("runningCount: {}", app.running_count()),
        format!("unavailableCount: {}", app.unavailable_count()),
    ]
    .join("\n")
}

/// Prefix a message body with an optional configured prefix.
pub fn with_prefix(prefix: Option<&str>, body: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix} {body}"),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Container;
    use crate::sample::MetricWindow;

    fn sample() -> MetricSample {
        MetricSample {
            timestamp: 1_600_000_000,
            cpu: 0.9,
            cpu_cap: 1.0,
            memory: 128.0,
            memory_cap: 512.0,
            connections: 42.0,
        }
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(compact_number(90.0), "90");
        assert_eq!(compact_number(80.0), "80");
        assert_eq!(compact_number(85.55), "85.6");
        assert_eq!(compact_number(0.0), "0");
        assert_eq!(compact_number(-0.01), "0");
    }

    #[test]
    fn app_link_points_at_containers_page() {
        assert_eq!(
            app_link("shop.example.com"),
            "shop.example.com - <https://galaxy.meteor.com/app/shop.example.com/containers|see on Galaxy>"
        );
    }

    #[test]
    fn slack_timestamp_token() {
        assert_eq!(
            slack_timestamp(1_600_000_000),
            "<!date^1600000000^{date_short_pretty} at {time_secs}|1600000000>"
        );
    }

    #[test]
    fn metric_listings() {
        let text = metrics_text(&sample());
        assert_eq!(
            text,
            "*cpuPercentage*\n90.0%\n*memoryPercentage*\n25.0%\n*connections*\n42"
        );

        let mut undefined = sample();
        undefined.cpu_cap = 0.0;
        assert!(!metrics_lines(&undefined).contains("cpuPercentage"));
    }

    #[test]
    fn fleet_summary() {
        let app = Application {
            id: "app-1".to_string(),
            hostname: "shop.example.com".to_string(),
            status: "running".to_string(),
            containers: vec![Container {
                id: "c1".to_string(),
                status: "running".to_string(),
                up: true,
                metrics: MetricWindow::default(),
            }],
            metrics: MetricWindow::default(),
        };
        let lines = fleet_lines(&app);
        assert!(lines.contains("runningCount: 1"));
        assert!(lines.contains("unavailableCount: 0"));
    }

    #[test]
    fn app_metrics_include_connections_by_container() {
        let up = |id: &str| Container {
            id: id.to_string(),
            status: "running".to_string(),
            up: true,
            metrics: MetricWindow::default(),
        };
        let mut app = Application {
            id: "app-1".to_string(),
            hostname: "shop.example.com".to_string(),
            status: "running".to_string(),
            containers: vec![up("c1"), up("c2"), up("c3"), up("c4")],
            metrics: MetricWindow::newest(vec![sample()], 5),
        };
        assert_eq!(
            app_metrics_lines(&app),
            "cpuPercentage: 90.0%\nmemoryPercentage: 25.0%\nconnections: 42\nconnectionsByContainer: 10.5"
        );

        app.containers.clear();
        assert!(!app_metrics_lines(&app).contains("connectionsByContainer"));
    }

    #[test]
    fn prefixes() {
        assert_eq!(with_prefix(Some("[prod]"), "hello"), "[prod] hello");
        assert_eq!(with_prefix(Some(""), "hello"), "hello");
        assert_eq!(with_prefix(None, "hello"), "hello");
    }
}
