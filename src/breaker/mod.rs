//! Breaker core.
//!
//! # Data Flow
//! ```text
//! Trigger {consumer_id}
//!     → orchestrator.rs (phase loop, checkpoints, events)
//!     → gate.rs     (disable intake; re-enable on recovery)
//!     → probe.rs    (fetch one unit, invoke worker, acknowledge)
//!     → backoff.rs  (attempt counter, doubling interval, exhaust decision)
//!     → rejitter.rs (optional bounded backlog redistribution)
//! ```
//!
//! # Design Decisions
//! - The retry loop is an explicit iterative phase, not recursion; attempt
//!   state lives in the serializable incident record
//! - Transport-level fetch retries are a separate fixed envelope and never
//!   consume the business attempt counter
//! - Gate failures, acknowledge failures and exhausted envelopes are all
//!   terminal; the breaker performs no silent retries across terminal
//!   boundaries

pub mod backoff;
pub mod gate;
pub mod orchestrator;
pub mod probe;
pub mod rejitter;
pub mod types;
