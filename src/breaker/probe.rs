//! Recovery probe.
//!
//! Draws one representative unit from the queue and invokes the worker
//! with it. The fetch has its own fixed retry envelope for transient
//! transport unavailability; those retries never consume the business
//! attempt counter. Deleting the unit after a successful probe is fatal on
//! failure, since a stale probe unit risks infinite reprocessing.

use std::sync::Arc;
use std::time::Duration;

use crate::config::TransportRetryConfig;
use crate::incident::ProbeUnit;
use crate::observability::metrics;
use crate::transport::{WorkQueue, Worker, WorkerFailure};

use super::types::BreakerError;

pub struct Probe {
    queue: Arc<dyn WorkQueue>,
    worker: Arc<dyn Worker>,
    envelope: TransportRetryConfig,
    queue_name: String,
}

impl Probe {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        worker: Arc<dyn Worker>,
        envelope: TransportRetryConfig,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            worker,
            envelope,
            queue_name: queue_name.into(),
        }
    }

    /// Fetch exactly one unit, retrying transient unavailability (and an
    /// empty queue) inside the fixed envelope.
    pub async fn fetch_one(&self) -> Result<ProbeUnit, BreakerError> {
        let mut interval = self.envelope.interval_secs;
        let mut last_reason = String::new();

        for attempt in 1..=self.envelope.max_attempts {
            match self.queue.receive_one().await {
                Ok(Some(unit)) => {
                    tracing::debug!(
                        queue = %self.queue_name,
                        fetch_attempt = attempt,
                        "Probe unit fetched"
                    );
                    return Ok(ProbeUnit::from_queue_unit(unit, &self.queue_name));
                }
                Ok(None) => {
                    last_reason = "no message available".to_string();
                }
                Err(e) => {
                    last_reason = e.to_string();
                }
            }

            tracing::warn!(
                queue = %self.queue_name,
                fetch_attempt = attempt,
                max_attempts = self.envelope.max_attempts,
                reason = %last_reason,
                "Probe fetch failed, transient"
            );

            if attempt < self.envelope.max_attempts {
                tokio::time::sleep(Duration::from_secs(interval)).await;
                interval = interval.saturating_mul(self.envelope.backoff_rate as u64);
            }
        }

        Err(BreakerError::TransportExhausted {
            attempts: self.envelope.max_attempts,
            reason: last_reason,
        })
    }

    /// Invoke the worker with the probe unit's body. A failure is the
    /// recoverable signal that drives the backoff loop.
    pub async fn invoke(&self, consumer_id: &str, unit: &ProbeUnit) -> Result<(), WorkerFailure> {
        metrics::record_probe_attempt(consumer_id);
        let result = self.worker.invoke(&unit.body).await;
        match &result {
            Ok(()) => {
                tracing::info!(consumer = %consumer_id, queue = %unit.queue, "Probe succeeded");
            }
            Err(e) => {
                tracing::warn!(consumer = %consumer_id, queue = %unit.queue, error = %e, "Probe failed");
            }
        }
        result
    }

    /// Delete the probe unit after worker success. Failure is terminal.
    pub async fn acknowledge(&self, unit: &ProbeUnit) -> Result<(), BreakerError> {
        self.queue
            .delete(&unit.receipt)
            .await
            .map_err(|e| BreakerError::Acknowledge {
                reason: e.to_string(),
            })
    }
}
