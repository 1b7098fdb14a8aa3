//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the breaker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the circuit breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Name of the queue probed and rejittered during an incident.
    /// Used for logging and metric labels.
    pub queue_name: String,

    /// Business-level probe retry settings.
    pub retry: RetryConfig,

    /// Backlog rejitter settings.
    pub rejitter: RejitterConfig,

    /// Transport-level fetch retry envelope.
    pub transport_retry: TransportRetryConfig,

    /// Directory for incident checkpoint snapshots.
    pub state_dir: String,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Business-level retry configuration for the probe loop.
///
/// Immutable for an incident's lifetime; the orchestrator snapshots it at
/// trigger time.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// First wait before/between probes, in seconds.
    pub initial_backoff_secs: u64,

    /// Probe retry ceiling. Exceeding it is the only path to terminal
    /// failure from the retry loop.
    pub max_attempts: u32,

    /// Interval multiplier per failed attempt.
    pub growth_factor: u32,

    /// Optional ceiling on the retry interval. `None` preserves pure
    /// doubling: `interval_i = initial * growth^(i-1)`, unbounded.
    pub max_interval_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 10,
            max_attempts: 10,
            growth_factor: 2,
            max_interval_secs: None,
        }
    }
}

/// Backlog rejitter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RejitterConfig {
    /// Enable the rejitter stage after a successful probe.
    pub enabled: bool,

    /// Drain duration in seconds. The secondary drain deactivates
    /// unconditionally after this long, even if backlog remains.
    pub initial_settle_delay_secs: u64,

    /// Span of the random re-enqueue delay, in seconds. Each drained unit
    /// is re-enqueued with a delay uniform in
    /// `[settle, settle + window - 1]`.
    pub jitter_window_secs: u64,
}

impl Default for RejitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_settle_delay_secs: 60,
            jitter_window_secs: 120,
        }
    }
}

/// Transport-level retry envelope for the probe fetch.
///
/// Distinct from [`RetryConfig`]: these retries absorb transient transport
/// unavailability and never consume the business attempt counter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportRetryConfig {
    /// Maximum fetch attempts before escalating to terminal failure.
    pub max_attempts: u32,

    /// Initial wait between fetch attempts, in seconds.
    pub interval_secs: u64,

    /// Interval multiplier per fetch attempt.
    pub backoff_rate: u32,
}

impl Default for TransportRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_secs: 10,
            backoff_rate: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            queue_name: "work".to_string(),
            retry: RetryConfig::default(),
            rejitter: RejitterConfig::default(),
            transport_retry: TransportRetryConfig::default(),
            state_dir: "state/incidents".to_string(),
            observability: ObservabilityConfig::default(),
        }
    }
}
