//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BreakerConfig (validated, immutable)
//!     → CurrentConfig (arc-swap cell)
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → push onto CurrentConfig
//!
//! At incident start:
//!     Orchestrator snapshots CurrentConfig
//!     → snapshot is immutable for the incident's lifetime
//! ```
//!
//! # Design Decisions
//! - A running incident never observes a reload; it works from the snapshot
//!   taken when its trigger arrived
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::BreakerConfig;
pub use schema::RejitterConfig;
pub use schema::RetryConfig;
pub use schema::TransportRetryConfig;
pub use watcher::{watch_config, CurrentConfig};
