//! Incident state.
//!
//! # Data Flow
//! ```text
//! Trigger {consumer_id}
//!     → Incident::new (config snapshot frozen in)
//!     → mutated only by the orchestrator, one phase at a time
//!     → store.rs checkpoints every transition
//!     → registry.rs enforces one active incident per consumer
//!     → removed from the registry on a terminal phase
//! ```
//!
//! # Design Decisions
//! - The incident is a plain serializable record; all sequencing lives in
//!   the orchestrator and all math in the backoff policy
//! - `wake_at_unix` makes an in-progress wait resumable: after a restart
//!   only the remaining time is slept

pub mod registry;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{RejitterConfig, RetryConfig, TransportRetryConfig};
use crate::transport::QueueUnit;

/// Phase of the breaker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Disabling,
    Waiting,
    Testing,
    Retrying,
    Succeeding,
    Rejittering,
    Enabling,
    Restored,
    Failed,
}

impl Phase {
    /// Terminal phases end the incident; there is no automatic re-entry.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Restored | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Disabling => "disabling",
            Phase::Waiting => "waiting",
            Phase::Testing => "testing",
            Phase::Retrying => "retrying",
            Phase::Succeeding => "succeeding",
            Phase::Rejittering => "rejittering",
            Phase::Enabling => "enabling",
            Phase::Restored => "restored",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The single work item drawn to test recovery.
///
/// Owned exclusively by the active incident; never shared between two
/// incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeUnit {
    /// Opaque message body, replayed on every probe attempt.
    pub body: String,
    /// Acknowledgment token for the delete after a successful probe.
    pub receipt: String,
    /// Origin queue name (logging and metric labels).
    pub queue: String,
}

impl ProbeUnit {
    pub fn from_queue_unit(unit: QueueUnit, queue: impl Into<String>) -> Self {
        Self {
            body: unit.body,
            receipt: unit.receipt,
            queue: queue.into(),
        }
    }
}

/// One execution of the breaker workflow, from trigger to terminal phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub consumer_id: String,
    pub phase: Phase,

    /// Business-level probe attempt count. 0 until the first fetch.
    pub attempt: u32,

    /// Current retry interval in seconds. Doubles on every failed attempt.
    pub retry_interval_secs: u64,

    /// The unit under probe, once fetched.
    pub probe_unit: Option<ProbeUnit>,

    /// Unix timestamp the current durable wait ends at, if one is in
    /// progress.
    pub wake_at_unix: Option<u64>,

    /// Why the incident failed, for terminal `Failed` incidents.
    pub failure_reason: Option<String>,

    // Config snapshot, immutable for the incident's lifetime.
    pub queue_name: String,
    pub retry: RetryConfig,
    pub rejitter: RejitterConfig,
    pub transport_retry: TransportRetryConfig,
}

impl Incident {
    pub fn new(
        consumer_id: impl Into<String>,
        queue_name: impl Into<String>,
        retry: RetryConfig,
        rejitter: RejitterConfig,
        transport_retry: TransportRetryConfig,
    ) -> Self {
        let retry_interval_secs = retry.initial_backoff_secs;
        Self {
            id: Uuid::new_v4(),
            consumer_id: consumer_id.into(),
            phase: Phase::Idle,
            attempt: 0,
            retry_interval_secs,
            probe_unit: None,
            wake_at_unix: None,
            failure_reason: None,
            queue_name: queue_name.into(),
            retry,
            rejitter,
            transport_retry,
        }
    }

    /// Record the first successful fetch: attempt 1, interval reset to the
    /// configured initial value.
    pub fn record_fetch(&mut self, unit: ProbeUnit) {
        self.probe_unit = Some(unit);
        self.attempt = 1;
        self.retry_interval_secs = self.retry.initial_backoff_secs;
    }
}
