//! End-to-end breaker scenarios over in-memory transports.
//!
//! All tests run under paused tokio time, so hour-long backoff schedules
//! complete instantly while elapsed virtual time stays exact.

mod common;

use std::time::Duration;

use queue_breaker::config::BreakerConfig;
use queue_breaker::{BreakerError, Phase, TerminalStatus, Trigger};

use common::{Harness, ScriptedWorker};

fn config() -> BreakerConfig {
    BreakerConfig::default()
}

#[tokio::test(start_paused = true)]
async fn worker_never_recovers_exhausts_attempts_and_fails() {
    let harness = Harness::build(config(), ScriptedWorker::always_failing());
    harness.queue.push("probe-unit");

    let started = tokio::time::Instant::now();
    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Failed);
    // Exactly ten probes, never an eleventh.
    assert_eq!(harness.worker.invocations(), 10);
    // Waits 10, 20, 40, ..., 5120 seconds: 10 * (2^10 - 1).
    assert_eq!(started.elapsed().as_secs(), 10_230);
    // Gate was disabled once and never re-enabled.
    assert!(!harness.gate.is_enabled("orders-consumer"));
    assert_eq!(
        harness.gate.calls(),
        vec![("orders-consumer".to_string(), false)]
    );
    // The probe unit was never acknowledged.
    assert_eq!(harness.queue.in_flight_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn worker_recovers_on_fourth_attempt() {
    let harness = Harness::build(config(), ScriptedWorker::failing_first(3));
    harness.queue.push("probe-unit");

    let mut events = harness.orchestrator.subscribe();

    let started = tokio::time::Instant::now();
    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Restored);
    assert_eq!(harness.worker.invocations(), 4);
    // Waits 10 + 20 + 40 + 80; rejitter disabled, enable is immediate.
    assert_eq!(started.elapsed().as_secs(), 150);

    // Probe unit deleted and gate re-enabled.
    assert_eq!(harness.queue.in_flight_len(), 0);
    assert_eq!(harness.queue.ready_len(), 0);
    assert!(harness.gate.is_enabled("orders-consumer"));

    // Gate span: disabled at incident start, enabled exactly once at the
    // end, nothing in between.
    assert_eq!(
        harness.gate.calls(),
        vec![
            ("orders-consumer".to_string(), false),
            ("orders-consumer".to_string(), true),
        ]
    );

    // Phase stream ends in Restored without a Rejittering phase.
    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        phases.push(event.phase);
    }
    assert_eq!(phases.first(), Some(&Phase::Disabling));
    assert_eq!(phases.last(), Some(&Phase::Restored));
    assert!(!phases.contains(&Phase::Rejittering));
    assert_eq!(phases.iter().filter(|p| **p == Phase::Testing).count(), 4);
}

#[tokio::test(start_paused = true)]
async fn rejitter_redistributes_backlog_within_bounds() {
    let mut config = config();
    config.rejitter.enabled = true;
    config.rejitter.initial_settle_delay_secs = 60;
    config.rejitter.jitter_window_secs = 120;

    let harness = Harness::build(config, ScriptedWorker::succeeding());
    harness.queue.push("probe-unit");
    for i in 0..30 {
        harness.queue.push(format!("backlog-{}", i));
    }

    let started = tokio::time::Instant::now();
    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Restored);
    // 10s initial wait, then the drain deactivates at exactly 60s even
    // though it went idle long before.
    assert_eq!(started.elapsed().as_secs(), 70);

    // Every backlog unit re-enqueued with a delay in [60, 179].
    let delays = harness.queue.delayed_delays();
    assert_eq!(delays.len(), 30);
    for delay in &delays {
        assert!((60..=179).contains(delay), "delay {} outside [60, 179]", delay);
    }

    // Gate enabled only after deactivation; originals all consumed.
    assert!(harness.gate.is_enabled("orders-consumer"));
    assert_eq!(harness.queue.in_flight_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn gate_disable_failure_fails_with_zero_probes() {
    let harness = Harness::build(config(), ScriptedWorker::succeeding());
    harness.queue.push("probe-unit");
    harness.gate.fail_next_calls(1);

    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Failed);
    assert_eq!(harness.worker.invocations(), 0);
    // The unit was never even fetched.
    assert_eq!(harness.queue.ready_len(), 1);
    assert_eq!(harness.queue.in_flight_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn acknowledge_failure_after_worker_success_is_terminal() {
    let harness = Harness::build(config(), ScriptedWorker::succeeding());
    harness.queue.push("probe-unit");
    harness.queue.fail_next_deletes(1);

    let started = tokio::time::Instant::now();
    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Failed);
    // The worker did succeed; only the acknowledge was lost.
    assert_eq!(harness.worker.invocations(), 1);
    assert_eq!(started.elapsed().as_secs(), 10);

    // Gate stays disabled: disabled at incident start, never re-enabled.
    assert!(!harness.gate.is_enabled("orders-consumer"));
    assert_eq!(
        harness.gate.calls(),
        vec![("orders-consumer".to_string(), false)]
    );

    // The delete was attempted exactly once. The injection covers only the
    // first delete, so a retry would have drained the in-flight unit.
    assert_eq!(harness.queue.in_flight_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_queue_exhausts_transport_envelope_and_fails() {
    let harness = Harness::build(config(), ScriptedWorker::succeeding());

    let started = tokio::time::Instant::now();
    let status = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(status, TerminalStatus::Failed);
    assert_eq!(harness.worker.invocations(), 0);
    // 10s business wait plus the fetch envelope: 10 + 20 + 40 + 80.
    assert_eq!(started.elapsed().as_secs(), 160);
    assert!(!harness.gate.is_enabled("orders-consumer"));
}

#[tokio::test(start_paused = true)]
async fn second_trigger_for_active_consumer_is_rejected() {
    let harness = Harness::build(config(), ScriptedWorker::always_failing());
    harness.queue.push("probe-unit");

    let orchestrator = harness.orchestrator.clone();
    let rx = harness.shutdown.subscribe();
    let first = tokio::spawn(async move {
        orchestrator
            .handle_trigger(Trigger::new("orders-consumer"), rx)
            .await
    });

    // Let the first incident reach its initial wait.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let err = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap_err();
    assert!(matches!(err, BreakerError::IncidentActive { .. }));

    // A different consumer is unaffected by the claim.
    assert!(harness
        .orchestrator
        .active_incident("orders-consumer")
        .is_some());
    assert!(harness
        .orchestrator
        .active_incident("billing-consumer")
        .is_none());

    harness.shutdown.trigger();
    let result = first.await.unwrap();
    assert!(matches!(result, Err(BreakerError::Interrupted { .. })));

    // The interrupted incident released its claim.
    assert!(harness
        .orchestrator
        .active_incident("orders-consumer")
        .is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_config_snapshot_rejects_the_trigger() {
    let mut config = config();
    config.retry.max_attempts = 0;

    let harness = Harness::build(config, ScriptedWorker::succeeding());
    let err = harness
        .orchestrator
        .handle_trigger(Trigger::new("orders-consumer"), harness.shutdown.subscribe())
        .await
        .unwrap_err();

    assert!(matches!(err, BreakerError::Config(_)));
    assert_eq!(harness.gate.calls().len(), 0);
}
