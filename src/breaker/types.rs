//! Breaker types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::incident::Phase;

/// Signal raised by an external health monitor to start one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// The consumer whose intake should be halted.
    pub consumer_id: String,
}

impl Trigger {
    pub fn new(consumer_id: impl Into<String>) -> Self {
        Self {
            consumer_id: consumer_id.into(),
        }
    }
}

/// Terminal outcome of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Gate re-enabled, worker unblocked.
    Restored,
    /// Gate left disabled; requires an external re-trigger or manual
    /// intervention.
    Failed,
}

/// Published on the event channel at every phase transition, for external
/// alerting/audit collaborators.
#[derive(Debug, Clone)]
pub struct IncidentEvent {
    pub incident_id: Uuid,
    pub consumer_id: String,
    pub phase: Phase,
    pub attempt: u32,
}

/// Errors that end or reject an incident.
#[derive(Debug, Error)]
pub enum BreakerError {
    /// Gate enable/disable call failed. Fatal, never retried.
    #[error("gate call failed for consumer {consumer_id}: {reason}")]
    Gate { consumer_id: String, reason: String },

    /// The transport-level fetch envelope was exhausted without a unit.
    #[error("transport retries exhausted after {attempts} fetch attempts: {reason}")]
    TransportExhausted { attempts: u32, reason: String },

    /// The business attempt counter exceeded the configured ceiling.
    #[error("retries exhausted after {attempts} probe attempts")]
    RetryExhausted { attempts: u32 },

    /// Delete-after-success failed. Fatal; a stale probe unit risks
    /// infinite reprocessing.
    #[error("failed to acknowledge probe unit: {reason}")]
    Acknowledge { reason: String },

    /// A concurrent trigger arrived while an incident was already active
    /// for the consumer.
    #[error("incident {active} already active for consumer {consumer_id}")]
    IncidentActive { consumer_id: String, active: Uuid },

    /// The config snapshot failed validation at incident start.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A checkpoint could not be written or read.
    #[error(transparent)]
    Store(#[from] crate::incident::store::StoreError),

    /// Shutdown was requested mid-incident. The incident remains
    /// non-terminal on disk and is picked up by `resume_all`.
    #[error("shutdown requested while incident was in phase {phase}")]
    Interrupted { phase: Phase },
}
