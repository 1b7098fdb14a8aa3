//! Backlog rejitter stage.
//!
//! After a successful probe, the backlog that accumulated while the gate
//! was disabled would otherwise hit the recovered worker as one spike.
//! This stage drains the queue through a secondary path for a fixed
//! duration, re-enqueueing each unit with a uniformly random delay in
//! `[settle, settle + window - 1]` seconds. The drain deactivates
//! unconditionally when the settle delay elapses, even if backlog remains;
//! later units flow through the re-enabled normal path.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::config::RejitterConfig;
use crate::observability::metrics;
use crate::transport::WorkQueue;

/// How long to idle when the queue comes up empty mid-drain.
const IDLE_POLL: Duration = Duration::from_secs(1);

pub struct RejitterStage {
    queue: Arc<dyn WorkQueue>,
    config: RejitterConfig,
    queue_name: String,
}

impl RejitterStage {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        config: RejitterConfig,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            config,
            queue_name: queue_name.into(),
        }
    }

    /// Drain until the settle delay elapses. Returns how many units were
    /// rejittered.
    pub async fn run(&self, consumer_id: &str) -> u64 {
        let settle = Duration::from_secs(self.config.initial_settle_delay_secs);
        let deadline = Instant::now() + settle;
        let mut rejittered = 0u64;

        tracing::info!(
            consumer = %consumer_id,
            queue = %self.queue_name,
            settle_secs = self.config.initial_settle_delay_secs,
            window_secs = self.config.jitter_window_secs,
            "Rejitter drain activated"
        );

        while Instant::now() < deadline {
            match self.queue.receive_one().await {
                Ok(Some(unit)) => {
                    let delay = self.jittered_delay();
                    // Re-enqueue first, then consume the original; a crash
                    // between the two duplicates a unit rather than losing
                    // one.
                    if let Err(e) = self.queue.enqueue(unit.body.clone(), delay).await {
                        tracing::error!(queue = %self.queue_name, error = %e, "Rejitter enqueue failed, skipping unit");
                        continue;
                    }
                    if let Err(e) = self.queue.delete(&unit.receipt).await {
                        tracing::error!(queue = %self.queue_name, error = %e, "Rejitter delete failed");
                        continue;
                    }
                    rejittered += 1;
                    metrics::record_rejittered_unit(consumer_id);
                }
                Ok(None) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(IDLE_POLL.min(remaining)).await;
                }
                Err(e) => {
                    tracing::warn!(queue = %self.queue_name, error = %e, "Rejitter receive failed");
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(IDLE_POLL.min(remaining)).await;
                }
            }
        }

        tracing::info!(
            consumer = %consumer_id,
            queue = %self.queue_name,
            rejittered,
            "Rejitter drain deactivated"
        );
        rejittered
    }

    /// `settle + uniform(0, window - 1)` seconds.
    fn jittered_delay(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..self.config.jitter_window_secs);
        Duration::from_secs(self.config.initial_settle_delay_secs + jitter)
    }
}
