//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_phase_transitions_total` (counter): transitions by consumer, phase
//! - `breaker_probe_attempts_total` (counter): worker invocations by consumer
//! - `breaker_gate_disabled` (gauge): 1 while a consumer's intake is halted
//! - `breaker_incidents_total` (counter): terminal incidents by consumer, outcome
//! - `breaker_rejittered_units_total` (counter): backlog units redistributed

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::incident::Phase;

/// Install the Prometheus exporter on the given address.
///
/// Must be called from within a tokio runtime; the scrape endpoint is
/// served on it.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter started");
    Ok(())
}

pub fn record_phase_transition(consumer_id: &str, phase: Phase) {
    counter!(
        "breaker_phase_transitions_total",
        "consumer" => consumer_id.to_string(),
        "phase" => phase.to_string()
    )
    .increment(1);
}

pub fn record_probe_attempt(consumer_id: &str) {
    counter!(
        "breaker_probe_attempts_total",
        "consumer" => consumer_id.to_string()
    )
    .increment(1);
}

pub fn record_gate_state(consumer_id: &str, enabled: bool) {
    gauge!(
        "breaker_gate_disabled",
        "consumer" => consumer_id.to_string()
    )
    .set(if enabled { 0.0 } else { 1.0 });
}

pub fn record_incident_outcome(consumer_id: &str, outcome: &'static str) {
    counter!(
        "breaker_incidents_total",
        "consumer" => consumer_id.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rejittered_unit(consumer_id: &str) {
    counter!(
        "breaker_rejittered_units_total",
        "consumer" => consumer_id.to_string()
    )
    .increment(1);
}
