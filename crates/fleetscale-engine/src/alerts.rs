//! Application-level notifications that do not mutate the fleet.
//!
//! `maxInApp` alert rules fire when every application sample with a
//! defined value is above the configured maximum. The info note is a
//! periodic status summary.

use tracing::{info, warn};

use fleetscale_core::config::{AlertRules, InfoRules};
use fleetscale_core::format::{app_link, app_metrics_lines, fleet_lines, metric_value, slack_timestamp, with_prefix};
use fleetscale_core::{Application, Message, MetricField, Notifier};

/// Alert body for `field` if every defined sample exceeds `max`.
pub fn metric_above_max(app: &Application, field: MetricField, max: f64) -> Option<String> {
    let values: Vec<(i64, f64)> = app
        .metrics
        .iter()
        .filter_map(|s| s.value(field).map(|v| (s.timestamp, v)))
        .collect();

    if values.is_empty() || !values.iter().all(|(_, v)| *v > max) {
        return None;
    }

    let summary = format!(
        "Latest {} metrics are above {}",
        values.len(),
        metric_value(field, max)
    );
    info!("alert: app {}: {summary}", app.hostname);

    let history = values
        .iter()
        .map(|(ts, v)| format!("{}: {}", slack_timestamp(*ts), metric_value(field, *v)))
        .collect::<Vec<_>>()
        .join("\n");
    let latest = app_metrics_lines(app);

    Some(format!(
        "{}: application\n*{field}*: {summary}\n{history}\n*Metrics*\n{latest}\n*Containers*\n{}",
        app_link(&app.hostname),
        fleet_lines(app)
    ))
}

/// Send one alert per `maxInApp` metric that is above its maximum.
///
/// Returns the number of alerts that fired. Delivery failures are logged.
pub async fn check_app_alerts(notifier: &dyn Notifier, app: &Application, rules: &AlertRules) -> usize {
    let mut fired = 0;
    for (field, max) in &rules.max_in_app {
        info!(metric = %field, max, "checking alerts");
        let Some(body) = metric_above_max(app, *field, *max) else {
            continue;
        };
        fired += 1;
        let message = Message::new(
            rules.channel.as_deref(),
            with_prefix(rules.message_prefix.as_deref(), &body),
        );
        if let Err(e) = notifier.alert(&message).await {
            warn!(app = %app.hostname, metric = %field, error = %e, "failed to deliver alert");
        }
    }
    fired
}

/// Informational summary of the latest metrics and container counts.
pub fn info_note_text(app: &Application) -> String {
    let latest = app_metrics_lines(app);
    format!(
        "{}\n*Metrics*\n{latest}\n*Containers*\n{}",
        app_link(&app.hostname),
        fleet_lines(app)
    )
}

/// Send the info note when `infoRules.send` is set.
pub async fn send_info_note(notifier: &dyn Notifier, app: &Application, rules: &InfoRules) -> bool {
    if !rules.send {
        return false;
    }
    info!(app = %app.hostname, "sending info note");
    let message = Message::new(
        rules.channel.as_deref(),
        with_prefix(rules.message_prefix.as_deref(), &info_note_text(app)),
    );
    if let Err(e) = notifier.note(&message).await {
        warn!(app = %app.hostname, error = %e, "failed to deliver info note");
    }
    true
}
