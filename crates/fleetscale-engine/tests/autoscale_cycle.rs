//! Autoscale cycle tests.
//!
//! Drives `ScalingController` end to end against an in-memory fleet API
//! and notifier that record every call.

use std::sync::{Arc, Mutex};

use fleetscale_core::*;
use fleetscale_engine::*;

#[derive(Default)]
struct FakeFleet {
    calls: Mutex<Vec<String>>,
    fail_mutations: bool,
}

impl FakeFleet {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> PortFuture<'_, ()> {
        self.calls.lock().unwrap().push(call);
        let fail = self.fail_mutations;
        Box::pin(async move {
            if fail {
                anyhow::bail!("502 bad gateway");
            }
            Ok(())
        })
    }
}

impl FleetApi for FakeFleet {
    fn fetch_application<'a>(
        &'a self,
        _hostname: &'a str,
        _series_name: &'a str,
        _limit: usize,
    ) -> PortFuture<'a, Application> {
        Box::pin(async { Err::<Application, _>(anyhow::anyhow!("snapshots are built by the tests")) })
    }

    fn set_container_count<'a>(&'a self, app_id: &'a str, container_count: u32) -> PortFuture<'a, ()> {
        self.record(format!("setContainerCount {app_id} {container_count}"))
    }

    fn kill_container<'a>(&'a self, app_id: &'a str, container_id: &'a str) -> PortFuture<'a, ()> {
        self.record(format!("killContainer {app_id} {container_id}"))
    }
}

#[derive(Default)]
struct FakeNotifier {
    alerts: Mutex<Vec<Message>>,
    unreachable: bool,
}

impl Notifier for FakeNotifier {
    fn note<'a>(&'a self, _message: &'a Message) -> PortFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn alert<'a>(&'a self, message: &'a Message) -> PortFuture<'a, ()> {
        self.alerts.lock().unwrap().push(message.clone());
        let unreachable = self.unreachable;
        Box::pin(async move {
            if unreachable {
                anyhow::bail!("slack webhook timed out");
            }
            Ok(())
        })
    }
}

fn sample(cpu_pct: f64, connections: f64) -> MetricSample {
    MetricSample {
        timestamp: 1_700_000_000,
        cpu: cpu_pct / 100.0,
        cpu_cap: 1.0,
        memory: 200.0,
        memory_cap: 1000.0,
        connections,
    }
}

fn container(id: &str, up: bool, samples: Vec<MetricSample>) -> Container {
    Container {
        id: id.to_string(),
        status: if up { "running" } else { "unhealthy" }.to_string(),
        up,
        metrics: MetricWindow::from_ordered(samples),
    }
}

fn application(containers: Vec<Container>, samples: Vec<MetricSample>) -> Application {
    Application {
        id: "app-42".to_string(),
        hostname: "shop.example.com".to_string(),
        status: "running".to_string(),
        containers,
        metrics: MetricWindow::from_ordered(samples),
    }
}

fn running(n: usize) -> Vec<Container> {
    (0..n)
        .map(|i| container(&format!("c{i}"), true, vec![sample(50.0, 20.0); 3]))
        .collect()
}

fn setup(fleet: FakeFleet, notifier: FakeNotifier) -> (ScalingController, Arc<FakeFleet>, Arc<FakeNotifier>) {
    let fleet = Arc::new(fleet);
    let notifier = Arc::new(notifier);
    (ScalingController::new(fleet.clone(), notifier.clone()), fleet, notifier)
}

fn add_on_cpu(min: u32, max: u32, above: f64) -> RuleSet {
    RuleSet {
        min_containers: Some(min),
        max_containers: Some(max),
        add_when: Some(Thresholds::default().with(ThresholdField::CpuPercentageAbove, above)),
        ..RuleSet::default()
    }
}

#[tokio::test]
async fn busy_app_scales_up_by_one() {
    let (controller, fleet, notifier) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);

    let acted = controller
        .run_autoscale_cycle(&app, &[add_on_cpu(2, 5, 80.0)], CycleOptions::default())
        .await
        .unwrap();

    assert!(acted);
    assert_eq!(fleet.calls(), vec!["setContainerCount app-42 4"]);
    let alerts = notifier.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].text.contains("cpuPercentage 90 is greater than cpuPercentageAbove 80"));
    assert!(alerts[0].text.contains("Scaling up containers to *4* from 3 (1 more)"));
}

#[tokio::test]
async fn simulation_decides_but_never_mutates() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);

    let report = controller
        .run_cycle(&app, &[add_on_cpu(2, 5, 80.0)], CycleOptions { simulation: true })
        .await
        .unwrap();

    assert_eq!(report.actions.len(), 1);
    assert_eq!(report.actions[0].action, PlannedAction::Scale { from: 3, to: 4 });
    assert_eq!(report.actions[0].outcome, Outcome::Simulated);
    assert!(!report.did_act());
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn one_quiet_sample_blocks_scale_up() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(
        running(3),
        vec![sample(90.0, 20.0), sample(79.0, 20.0), sample(90.0, 20.0)],
    );

    let acted = controller
        .run_autoscale_cycle(&app, &[add_on_cpu(2, 5, 80.0)], CycleOptions::default())
        .await
        .unwrap();
    assert!(!acted);
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn minimum_wins_over_thresholds() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let rules = RuleSet {
        reduce_when: Some(Thresholds::default().with(ThresholdField::CpuPercentageBelow, 50.0)),
        ..add_on_cpu(4, 8, 80.0)
    };
    let app = application(running(1), vec![sample(5.0, 0.0); 3]);

    controller
        .run_autoscale_cycle(&app, &[rules], CycleOptions::default())
        .await
        .unwrap();
    assert_eq!(fleet.calls(), vec!["setContainerCount app-42 4"]);
}

#[tokio::test]
async fn maximum_wins_over_thresholds() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(running(7), vec![sample(99.0, 0.0); 3]);

    controller
        .run_autoscale_cycle(&app, &[add_on_cpu(1, 5, 80.0)], CycleOptions::default())
        .await
        .unwrap();
    assert_eq!(fleet.calls(), vec!["setContainerCount app-42 5"]);
}

#[tokio::test]
async fn unhealthy_container_is_killed_alone() {
    let (controller, fleet, notifier) = setup(FakeFleet::default(), FakeNotifier::default());
    let mut containers = running(2);
    containers.push(container("zombie", false, vec![sample(0.0, 0.0); 3]));
    let app = application(containers, vec![sample(50.0, 20.0); 3]);
    let rules = RuleSet {
        kill_when: Some(Thresholds::default().with(ThresholdField::ConnectionsBelow, 1.0)),
        ..RuleSet::default()
    };

    let acted = controller
        .run_autoscale_cycle(&app, &[rules], CycleOptions::default())
        .await
        .unwrap();

    assert!(acted);
    assert_eq!(fleet.calls(), vec!["killContainer app-42 zombie"]);
    let alerts = notifier.alerts.lock().unwrap();
    assert!(alerts[0].text.contains("Killing zombie: connections 0 is less than connectionsBelow 1"));
}

#[tokio::test]
async fn updating_app_is_never_mutated() {
    let (controller, fleet, notifier) = setup(FakeFleet::default(), FakeNotifier::default());
    let mut containers = running(1);
    containers.push(container("zombie", false, vec![sample(0.0, 0.0); 3]));
    let mut app = application(containers, vec![sample(95.0, 20.0); 3]);
    app.status = "updating".to_string();
    let rules = RuleSet {
        kill_when: Some(Thresholds::default().with(ThresholdField::ConnectionsBelow, 1.0)),
        ..add_on_cpu(3, 6, 80.0)
    };

    let report = controller
        .run_cycle(&app, &[rules], CycleOptions::default())
        .await
        .unwrap();

    assert!(!report.did_act());
    assert_eq!(report.actions.len(), 2);
    assert!(report.actions.iter().all(|a| a.outcome == Outcome::SkippedUpdating));
    assert!(fleet.calls().is_empty());
    assert!(notifier.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rule_sets_trigger_independently_in_order() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let mut containers = running(3);
    containers.push(container("idle", true, vec![sample(1.0, 0.0); 3]));
    let app = application(containers, vec![sample(90.0, 20.0); 3]);

    let killer = RuleSet {
        kill_when: Some(Thresholds::default().with(ThresholdField::CpuPercentageBelow, 2.0)),
        ..RuleSet::default()
    };
    let scaler = add_on_cpu(2, 10, 80.0);

    let report = controller
        .run_cycle(&app, &[killer, scaler], CycleOptions::default())
        .await
        .unwrap();

    assert_eq!(report.actions.len(), 2);
    assert_eq!(report.actions[0].rule_set, 0);
    assert_eq!(report.actions[1].rule_set, 1);
    assert_eq!(
        fleet.calls(),
        vec!["killContainer app-42 idle", "setContainerCount app-42 5"]
    );
}

#[tokio::test]
async fn missing_maximum_aborts_the_cycle() {
    let (controller, fleet, _) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);
    let rules = RuleSet {
        add_when: Some(Thresholds::default().with(ThresholdField::CpuPercentageAbove, 80.0)),
        ..RuleSet::default()
    };

    let err = controller
        .run_autoscale_cycle(&app, &[RuleSet::default(), rules], CycleOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::MissingMaxContainers { index: 1 }));
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn remote_failure_propagates_without_retry() {
    let fleet = FakeFleet {
        fail_mutations: true,
        ..FakeFleet::default()
    };
    let (controller, fleet, notifier) = setup(fleet, FakeNotifier::default());
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);

    let err = controller
        .run_autoscale_cycle(&app, &[add_on_cpu(2, 5, 80.0)], CycleOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Remote(_)));
    assert!(!err.is_config());
    assert_eq!(fleet.calls().len(), 1);
    assert!(notifier.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_cycle() {
    let notifier = FakeNotifier {
        unreachable: true,
        ..FakeNotifier::default()
    };
    let (controller, fleet, _) = setup(FakeFleet::default(), notifier);
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);

    let acted = controller
        .run_autoscale_cycle(&app, &[add_on_cpu(2, 5, 80.0)], CycleOptions::default())
        .await
        .unwrap();

    assert!(acted);
    assert_eq!(fleet.calls(), vec!["setContainerCount app-42 4"]);
}

#[tokio::test]
async fn oversized_step_adds_a_single_container() {
    let (controller, fleet, notifier) = setup(FakeFleet::default(), FakeNotifier::default());
    let app = application(running(3), vec![sample(90.0, 20.0); 3]);
    let rules = RuleSet {
        containers_to_scale: 4,
        ..add_on_cpu(2, 5, 80.0)
    };

    controller
        .run_autoscale_cycle(&app, &[rules], CycleOptions::default())
        .await
        .unwrap();

    assert_eq!(fleet.calls(), vec!["setContainerCount app-42 4"]);
    let alerts = notifier.alerts.lock().unwrap();
    assert!(alerts[0].text.contains("Scaling up containers to *4* from 3 (1 more)"));
}
