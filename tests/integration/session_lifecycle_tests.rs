//! Session lifecycle against a real model process.
//!
//! The `model-link-stub` binary is launched as the model, so these tests
//! cover launch, the gate-throttled cycle, and stop end to end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use model_link::config::GlobalConfig;
use model_link::protocol::{Directive, GateTime};
use model_link::supervisor::ModelHealth;
use model_link::{AppError, Coordinator, CycleOutcome};

use super::test_helpers::{stub_config, unique_channel_name};

#[tokio::test]
async fn repeated_requests_share_one_session() {
    let channel = unique_channel_name();
    let coordinator = Coordinator::new(stub_config(&channel, &["--cycles", "0"]));

    let first = coordinator.get_or_create_session().await.unwrap();
    let second = coordinator.get_or_create_session().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.id(), second.id());
    let current = coordinator.current_session().await.unwrap();
    assert_eq!(current.id(), first.id());

    first.stop().await.unwrap();
}

#[tokio::test]
async fn full_cycle_returns_directives_and_closes_gate() {
    let channel = unique_channel_name();
    let coordinator = Coordinator::new(stub_config(
        &channel,
        &[
            "--cycles",
            "1",
            "--delay-seconds",
            "30",
            "--directive",
            "build",
            "--directive",
            "attack",
        ],
    ));
    let session = coordinator.get_or_create_session().await.unwrap();

    assert!(session.should_proceed(), "no gate before the first cycle");

    let before = GateTime::now();
    let directives: Vec<String> = session
        .update("minerals=50")
        .await
        .map(Directive::into_string)
        .collect();
    assert_eq!(directives, vec!["build", "attack"]);

    let gate = session.gate_time().expect("gate set by the reply");
    assert!(gate > before);
    assert!(!session.should_proceed(), "gate is 30 seconds out");
    assert!(session.should_proceed_at(gate));

    let status = session.stop().await.unwrap();
    assert_eq!(status, "exited normally (code 0)");
}

#[tokio::test]
async fn stopping_twice_is_invalid_state() {
    let channel = unique_channel_name();
    let coordinator = Coordinator::new(stub_config(&channel, &["--cycles", "0"]));
    let session = coordinator.get_or_create_session().await.unwrap();

    session.stop().await.unwrap();
    assert!(session.is_stopped());

    let again = session.stop().await;
    assert!(matches!(again, Err(AppError::InvalidState(_))), "got {again:?}");
}

#[tokio::test]
async fn stopped_session_refuses_cycles() {
    let channel = unique_channel_name();
    let coordinator = Coordinator::new(stub_config(&channel, &["--cycles", "0"]));
    let session = coordinator.get_or_create_session().await.unwrap();
    session.stop().await.unwrap();

    assert!(session.update("tick").await.is_empty());
    let outcome = session.cycle("tick").await;
    assert!(
        matches!(outcome, CycleOutcome::Degraded { reason: AppError::InvalidState(_) }),
        "got {outcome:?}"
    );
    assert_eq!(session.model_health().await, ModelHealth::NotStarted);
}

#[tokio::test]
async fn new_session_after_stop() {
    let channel = unique_channel_name();
    let coordinator = Coordinator::new(stub_config(&channel, &["--cycles", "0"]));

    let first = coordinator.get_or_create_session().await.unwrap();
    first.stop().await.unwrap();
    assert!(coordinator.current_session().await.is_none());

    let second = coordinator.get_or_create_session().await.unwrap();
    assert_ne!(first.id(), second.id());
    assert!(!second.is_stopped());

    second.stop().await.unwrap();
}

#[tokio::test]
async fn relaunch_waits_for_slow_stop() {
    let channel = unique_channel_name();
    // Outlives the 2s grace period, so stopping it takes the full grace.
    let coordinator = Coordinator::new(stub_config(&channel, &["--connect-window-seconds", "60"]));
    let first = coordinator.get_or_create_session().await.unwrap();

    let stopping = Arc::clone(&first);
    let stop_task = tokio::spawn(async move { stopping.stop().await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(first.is_stopped());

    let started = Instant::now();
    let second = coordinator.get_or_create_session().await.unwrap();

    assert!(stop_task.is_finished(), "new model launched before the old one exited");
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_ne!(first.id(), second.id());
    assert_eq!(first.model_health().await, ModelHealth::NotStarted);
    assert!(matches!(second.model_health().await, ModelHealth::Running { .. }));

    let old_status = stop_task.await.unwrap().unwrap();
    assert_ne!(old_status, "exited normally (code 0)");
    second.stop().await.unwrap();
}

#[tokio::test]
async fn stop_kills_model_that_outlives_grace() {
    let channel = unique_channel_name();
    // Serves forever; only the grace-period kill ends it.
    let coordinator = Coordinator::new(stub_config(&channel, &["--connect-window-seconds", "60"]));
    let session = coordinator.get_or_create_session().await.unwrap();
    assert!(matches!(session.model_health().await, ModelHealth::Running { .. }));

    let status = session.stop().await.unwrap();
    assert_ne!(status, "exited normally (code 0)");
}

#[tokio::test]
async fn missing_executable_is_process_launch_error() {
    let mut config = GlobalConfig::default();
    config.model.debug_executable = "no/such/model-binary".into();
    config.model.release_executable = "no/such/model-binary".into();
    let coordinator = Coordinator::new(config);

    let result = coordinator.get_or_create_session().await;
    assert!(matches!(result, Err(AppError::ProcessLaunch(_))), "got {result:?}");
    assert!(coordinator.current_session().await.is_none());
}
