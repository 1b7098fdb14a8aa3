//! Shared utilities for breaker integration tests.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use queue_breaker::config::{BreakerConfig, CurrentConfig};
use queue_breaker::incident::store::IncidentStore;
use queue_breaker::transport::memory::{InMemoryGate, InMemoryQueue};
use queue_breaker::transport::{Worker, WorkerFailure};
use queue_breaker::{Orchestrator, Shutdown};

/// Worker that fails its first `fail_first` invocations, then succeeds.
pub struct ScriptedWorker {
    fail_first: u32,
    invocations: AtomicU32,
}

impl ScriptedWorker {
    /// A worker that always succeeds.
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail_first: 0,
            invocations: AtomicU32::new(0),
        })
    }

    /// A worker that never succeeds.
    pub fn always_failing() -> Arc<Self> {
        Arc::new(Self {
            fail_first: u32::MAX,
            invocations: AtomicU32::new(0),
        })
    }

    /// A worker that fails the first `n` invocations.
    pub fn failing_first(n: u32) -> Arc<Self> {
        Arc::new(Self {
            fail_first: n,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn invoke(&self, _payload: &str) -> Result<(), WorkerFailure> {
        let n = self.invocations.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            Err(WorkerFailure::new("still broken"))
        } else {
            Ok(())
        }
    }
}

/// Everything a scenario test needs, wired over in-memory transports and a
/// temp checkpoint directory.
pub struct Harness {
    pub queue: Arc<InMemoryQueue>,
    pub gate: Arc<InMemoryGate>,
    pub worker: Arc<ScriptedWorker>,
    pub orchestrator: Arc<Orchestrator>,
    pub shutdown: Shutdown,
    pub state_dir: PathBuf,
}

impl Harness {
    pub fn build(config: BreakerConfig, worker: Arc<ScriptedWorker>) -> Self {
        let state_dir = temp_state_dir();
        Self::build_at(config, worker, state_dir)
    }

    /// Build over an existing state directory, for restart/resume tests.
    pub fn build_at(
        mut config: BreakerConfig,
        worker: Arc<ScriptedWorker>,
        state_dir: PathBuf,
    ) -> Self {
        config.state_dir = state_dir.to_string_lossy().into_owned();

        let queue = Arc::new(InMemoryQueue::new());
        let gate = Arc::new(InMemoryGate::new());
        let store = IncidentStore::open(&state_dir).unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            queue.clone(),
            gate.clone(),
            worker.clone(),
            CurrentConfig::new(config),
            store,
        ));

        Self {
            queue,
            gate,
            worker,
            orchestrator,
            shutdown: Shutdown::new(),
            state_dir,
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.state_dir);
    }
}

pub fn temp_state_dir() -> PathBuf {
    std::env::temp_dir().join(format!("breaker-test-{}", Uuid::new_v4()))
}
