//! External collaborator contracts.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → ConsumerGate (disable/enable intake for a consumer)
//!     → WorkQueue   (receive one, delete, delayed enqueue)
//!     → Worker      (synchronous probe invocation)
//! ```
//!
//! # Design Decisions
//! - The breaker owns none of these: the transport, the gate and the worker
//!   are capabilities injected by the embedder
//! - All side-effecting calls (set_enabled, delete, enqueue) must be
//!   idempotent; a crash-and-resume may re-issue the last step
//! - TransportError carries no retry policy; the caller decides which
//!   failures are absorbed by which envelope

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unit of work as handed out by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueUnit {
    /// Opaque message body.
    pub body: String,
    /// Acknowledgment token for a later delete.
    pub receipt: String,
}

/// Errors surfaced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport is temporarily unavailable.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The call was rejected outright (bad receipt, missing queue).
    #[error("transport rejected the call: {0}")]
    Rejected(String),
}

/// Worker rejection of a probe unit. Recoverable; drives the backoff loop.
#[derive(Debug, Error)]
#[error("worker rejected unit: {reason}")]
pub struct WorkerFailure {
    pub reason: String,
}

impl WorkerFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The message queue feeding the gated consumer.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Receive at most one unit. `Ok(None)` means the queue is currently
    /// empty.
    async fn receive_one(&self) -> Result<Option<QueueUnit>, TransportError>;

    /// Delete a previously received unit. Must be idempotent: deleting an
    /// already-deleted unit is not an error.
    async fn delete(&self, receipt: &str) -> Result<(), TransportError>;

    /// Enqueue a body, visible after `delay`.
    async fn enqueue(&self, body: String, delay: Duration) -> Result<(), TransportError>;
}

/// Subscription control for a consumer's intake.
#[async_trait]
pub trait ConsumerGate: Send + Sync {
    /// Enable or disable a consumer's ability to pull new work. Must
    /// tolerate at-least-once invocation.
    async fn set_enabled(&self, consumer_id: &str, enabled: bool) -> Result<(), TransportError>;
}

/// The downstream worker under protection.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Invoke the worker synchronously with one payload, wrapped in its
    /// normal input shape. A successful result is discarded.
    async fn invoke(&self, payload: &str) -> Result<(), WorkerFailure>;
}
