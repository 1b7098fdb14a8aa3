//! Consumer gate control.
//!
//! The gate is the enable/disable switch on a consumer's ability to pull
//! new work. Both calls are idempotent at the transport contract level, so
//! a crash-and-resume re-issuing the last toggle is safe. A failed gate
//! call is fatal to the incident and is never retried here.

use std::sync::Arc;

use crate::observability::metrics;
use crate::transport::ConsumerGate;

use super::types::BreakerError;

pub struct GateController {
    gate: Arc<dyn ConsumerGate>,
}

impl GateController {
    pub fn new(gate: Arc<dyn ConsumerGate>) -> Self {
        Self { gate }
    }

    /// Halt the consumer's intake.
    pub async fn disable(&self, consumer_id: &str) -> Result<(), BreakerError> {
        self.set(consumer_id, false).await
    }

    /// Resume the consumer's intake.
    pub async fn enable(&self, consumer_id: &str) -> Result<(), BreakerError> {
        self.set(consumer_id, true).await
    }

    async fn set(&self, consumer_id: &str, enabled: bool) -> Result<(), BreakerError> {
        match self.gate.set_enabled(consumer_id, enabled).await {
            Ok(()) => {
                tracing::info!(consumer = %consumer_id, enabled, "Gate toggled");
                metrics::record_gate_state(consumer_id, enabled);
                Ok(())
            }
            Err(e) => {
                tracing::error!(consumer = %consumer_id, enabled, error = %e, "Gate call failed");
                Err(BreakerError::Gate {
                    consumer_id: consumer_id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
