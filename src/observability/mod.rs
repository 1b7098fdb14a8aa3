//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! logging.rs: EnvFilter + fmt layer → stdout
//! metrics.rs: record_* helpers → metrics facade → Prometheus exporter
//! ```
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter the facade is a
//!   no-op, so library embedders pay nothing
//! - Labels are consumer and phase/outcome, never per-unit

pub mod logging;
pub mod metrics;
