//! Circuit-breaker control loop for queue-driven consumers.
//!
//! When an external health monitor raises a trigger for a consumer, the
//! breaker disables the consumer's intake gate, probes the downstream worker
//! with a single representative unit under exponential backoff, optionally
//! rejitters the accumulated backlog, and re-enables intake once the worker
//! recovers. Every phase transition is checkpointed to disk so a process
//! restart resumes an incident at its last completed phase.

pub mod breaker;
pub mod config;
pub mod incident;
pub mod lifecycle;
pub mod observability;
pub mod transport;

pub use breaker::orchestrator::Orchestrator;
pub use breaker::types::{BreakerError, IncidentEvent, TerminalStatus, Trigger};
pub use config::BreakerConfig;
pub use incident::{Incident, Phase, ProbeUnit};
pub use lifecycle::Shutdown;
