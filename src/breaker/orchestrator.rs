//! Incident orchestration.
//!
//! # State Machine
//! ```text
//! Idle → Disabling → Waiting → Testing → Succeeding → [Rejittering] → Enabling → Restored
//!                       ↑          │
//!                       └─ Retrying┘   (attempt ceiling → Failed)
//!
//! Failed also reachable from: Disabling/Enabling (gate error),
//!                             Testing (fetch envelope exhausted, ack failure)
//! ```
//!
//! # Design Decisions
//! - One incident per trigger; a consumer with an active incident rejects
//!   further triggers at entry
//! - Phases run strictly sequentially within an incident; incidents for
//!   different consumers run concurrently with no shared mutable state
//! - Every transition is checkpointed to the store, published on the event
//!   channel and recorded in metrics before the next step runs
//! - Waits are durable suspend points: {phase, wake_at} is persisted before
//!   sleeping, and a restart sleeps only the remaining time

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::validation::validate_config;
use crate::config::CurrentConfig;
use crate::incident::registry::IncidentRegistry;
use crate::incident::store::IncidentStore;
use crate::incident::{Incident, Phase};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::transport::{ConsumerGate, WorkQueue, Worker};

use super::backoff::{self, RetryDecision};
use super::gate::GateController;
use super::probe::Probe;
use super::rejitter::RejitterStage;
use super::types::{BreakerError, IncidentEvent, TerminalStatus, Trigger};

pub struct Orchestrator {
    queue: Arc<dyn WorkQueue>,
    gate: GateController,
    worker: Arc<dyn Worker>,
    config: Arc<CurrentConfig>,
    store: IncidentStore,
    registry: Arc<IncidentRegistry>,
    events: broadcast::Sender<IncidentEvent>,
}

impl Orchestrator {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        gate: Arc<dyn ConsumerGate>,
        worker: Arc<dyn Worker>,
        config: Arc<CurrentConfig>,
        store: IncidentStore,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            queue,
            gate: GateController::new(gate),
            worker,
            config,
            store,
            registry: IncidentRegistry::new(),
            events,
        }
    }

    /// Subscribe to phase-transition events for alerting/audit.
    pub fn subscribe(&self) -> broadcast::Receiver<IncidentEvent> {
        self.events.subscribe()
    }

    /// The incident currently active for a consumer, if any.
    pub fn active_incident(&self, consumer_id: &str) -> Option<Uuid> {
        self.registry.active_incident(consumer_id)
    }

    /// Run one incident for an externally raised trigger, to its terminal
    /// status.
    ///
    /// Fails without starting an incident if the config snapshot is invalid
    /// or the consumer already has one active. Returns
    /// [`BreakerError::Interrupted`] if shutdown fires mid-incident; the
    /// checkpoint on disk stays non-terminal and `resume_all` picks it up.
    pub async fn handle_trigger(
        &self,
        trigger: Trigger,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<TerminalStatus, BreakerError> {
        let snapshot = self.config.snapshot();
        validate_config(&snapshot).map_err(|errors| {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            BreakerError::Config(joined)
        })?;

        let incident = Incident::new(
            &trigger.consumer_id,
            &snapshot.queue_name,
            snapshot.retry.clone(),
            snapshot.rejitter.clone(),
            snapshot.transport_retry.clone(),
        );

        let _guard = self
            .registry
            .begin(&trigger.consumer_id, incident.id)
            .map_err(|active| BreakerError::IncidentActive {
                consumer_id: trigger.consumer_id.clone(),
                active,
            })?;

        tracing::info!(
            incident = %incident.id,
            consumer = %trigger.consumer_id,
            "Incident started"
        );
        self.run_incident(incident, shutdown).await
    }

    /// Resume every non-terminal incident found in the checkpoint store.
    ///
    /// Each incident continues from its last completed phase on its own
    /// task. Returns the join handles so callers can await completion.
    pub fn resume_all(
        self: &Arc<Self>,
        shutdown: &Shutdown,
    ) -> Result<Vec<JoinHandle<(Uuid, Result<TerminalStatus, BreakerError>)>>, BreakerError> {
        let mut handles = Vec::new();

        for incident in self.store.load_all()? {
            if incident.phase.is_terminal() {
                continue;
            }

            let guard = match self.registry.begin(&incident.consumer_id, incident.id) {
                Ok(guard) => guard,
                Err(active) => {
                    tracing::warn!(
                        incident = %incident.id,
                        consumer = %incident.consumer_id,
                        active = %active,
                        "Skipping resume, consumer already has an active incident"
                    );
                    continue;
                }
            };

            tracing::info!(
                incident = %incident.id,
                consumer = %incident.consumer_id,
                phase = %incident.phase,
                "Resuming incident from checkpoint"
            );

            let this = Arc::clone(self);
            let rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move {
                let _guard = guard;
                let id = incident.id;
                (id, this.run_incident(incident, rx).await)
            }));
        }

        Ok(handles)
    }

    /// Drive an incident's phase loop to a terminal phase.
    ///
    /// Explicitly iterative: the phase and attempt counter live in the
    /// incident record, so attempt counts are unbounded without stack
    /// growth and every step is serializable.
    async fn run_incident(
        &self,
        mut incident: Incident,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<TerminalStatus, BreakerError> {
        let probe = Probe::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.worker),
            incident.transport_retry.clone(),
            incident.queue_name.clone(),
        );

        loop {
            match incident.phase {
                Phase::Idle => {
                    self.transition(&mut incident, Phase::Disabling)?;
                }

                Phase::Disabling => {
                    if let Err(e) = self.gate.disable(&incident.consumer_id).await {
                        return self.fail(&mut incident, e);
                    }
                    self.transition(&mut incident, Phase::Waiting)?;
                }

                Phase::Waiting => {
                    self.durable_wait(&mut incident, &mut shutdown).await?;
                    self.transition(&mut incident, Phase::Testing)?;
                }

                Phase::Testing => {
                    // One unit per incident: the first test fetches it, every
                    // retry replays the same unit.
                    let unit = match incident.probe_unit.clone() {
                        Some(unit) => unit,
                        None => match probe.fetch_one().await {
                            Ok(unit) => {
                                incident.record_fetch(unit.clone());
                                self.store.save(&incident)?;
                                unit
                            }
                            Err(e) => return self.fail(&mut incident, e),
                        },
                    };

                    match probe.invoke(&incident.consumer_id, &unit).await {
                        Ok(()) => self.transition(&mut incident, Phase::Succeeding)?,
                        Err(_) => self.transition(&mut incident, Phase::Retrying)?,
                    }
                }

                Phase::Retrying => match backoff::on_failure(&mut incident) {
                    RetryDecision::Retry(_) => {
                        self.transition(&mut incident, Phase::Waiting)?;
                    }
                    RetryDecision::Exhausted => {
                        let attempts = incident.attempt.saturating_sub(1);
                        return self.fail(&mut incident, BreakerError::RetryExhausted { attempts });
                    }
                },

                Phase::Succeeding => {
                    // Re-acknowledging after a crash-resume is safe, delete
                    // is idempotent.
                    if let Some(unit) = incident.probe_unit.take() {
                        if let Err(e) = probe.acknowledge(&unit).await {
                            incident.probe_unit = Some(unit);
                            return self.fail(&mut incident, e);
                        }
                    }

                    if incident.rejitter.enabled {
                        self.transition(&mut incident, Phase::Rejittering)?;
                    } else {
                        self.transition(&mut incident, Phase::Enabling)?;
                    }
                }

                Phase::Rejittering => {
                    let stage = RejitterStage::new(
                        Arc::clone(&self.queue),
                        incident.rejitter.clone(),
                        incident.queue_name.clone(),
                    );
                    stage.run(&incident.consumer_id).await;
                    self.transition(&mut incident, Phase::Enabling)?;
                }

                Phase::Enabling => {
                    if let Err(e) = self.gate.enable(&incident.consumer_id).await {
                        return self.fail(&mut incident, e);
                    }
                    self.transition(&mut incident, Phase::Restored)?;
                }

                Phase::Restored => {
                    tracing::info!(
                        incident = %incident.id,
                        consumer = %incident.consumer_id,
                        attempts = incident.attempt,
                        "Incident restored"
                    );
                    metrics::record_incident_outcome(&incident.consumer_id, "restored");
                    return Ok(TerminalStatus::Restored);
                }

                Phase::Failed => {
                    metrics::record_incident_outcome(&incident.consumer_id, "failed");
                    return Ok(TerminalStatus::Failed);
                }
            }
        }
    }

    /// Durable suspend point: persist {phase, wake_at}, then sleep without
    /// blocking a worker thread. On resume after a restart, only the
    /// remaining time is slept.
    async fn durable_wait(
        &self,
        incident: &mut Incident,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<(), BreakerError> {
        let wait = match incident.wake_at_unix {
            // Resuming a wait that was already checkpointed.
            Some(wake_at) => Duration::from_secs(wake_at.saturating_sub(unix_now())),
            None => {
                let interval = Duration::from_secs(incident.retry_interval_secs);
                incident.wake_at_unix = Some(unix_now() + interval.as_secs());
                self.store.save(incident)?;
                interval
            }
        };

        tracing::debug!(
            incident = %incident.id,
            consumer = %incident.consumer_id,
            wait_secs = wait.as_secs(),
            attempt = incident.attempt,
            "Waiting before probe"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                incident.wake_at_unix = None;
                Ok(())
            }
            _ = shutdown.recv() => {
                tracing::info!(
                    incident = %incident.id,
                    consumer = %incident.consumer_id,
                    "Shutdown during wait, incident checkpointed for resume"
                );
                Err(BreakerError::Interrupted { phase: incident.phase })
            }
        }
    }

    /// Move to a new phase: checkpoint, publish, record.
    fn transition(&self, incident: &mut Incident, next: Phase) -> Result<(), BreakerError> {
        tracing::debug!(
            incident = %incident.id,
            consumer = %incident.consumer_id,
            from = %incident.phase,
            to = %next,
            attempt = incident.attempt,
            "Phase transition"
        );
        incident.phase = next;
        self.store.save(incident)?;
        metrics::record_phase_transition(&incident.consumer_id, next);
        let _ = self.events.send(IncidentEvent {
            incident_id: incident.id,
            consumer_id: incident.consumer_id.clone(),
            phase: next,
            attempt: incident.attempt,
        });
        Ok(())
    }

    /// Terminal failure: record the reason, transition to Failed, and
    /// surface the terminal status. The gate stays disabled.
    fn fail(
        &self,
        incident: &mut Incident,
        error: BreakerError,
    ) -> Result<TerminalStatus, BreakerError> {
        tracing::error!(
            incident = %incident.id,
            consumer = %incident.consumer_id,
            attempt = incident.attempt,
            error = %error,
            "Incident failed"
        );
        incident.failure_reason = Some(error.to_string());
        self.transition(incident, Phase::Failed)?;
        metrics::record_incident_outcome(&incident.consumer_id, "failed");
        Ok(TerminalStatus::Failed)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
