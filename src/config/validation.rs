//! Semantic configuration checks.
//!
//! Serde handles the syntactic layer; everything here is about values that
//! parse fine but make no operational sense (a zero attempt ceiling, a
//! rejitter window of zero seconds, an unparseable metrics address).
//! Validation also runs at incident start against the config snapshot, so a
//! hot-reloaded bad config can never drive an incident.

use std::fmt;

use crate::config::schema::BreakerConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    ZeroMaxAttempts,
    ZeroInitialBackoff,
    GrowthFactorTooSmall(u32),
    IntervalCapBelowInitial { cap: u64, initial: u64 },
    ZeroSettleDelay,
    ZeroJitterWindow,
    ZeroTransportAttempts,
    EmptyQueueName,
    EmptyStateDir,
    BadMetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroMaxAttempts => {
                write!(f, "retry.max_attempts must be at least 1")
            }
            ValidationError::ZeroInitialBackoff => {
                write!(f, "retry.initial_backoff_secs must be at least 1")
            }
            ValidationError::GrowthFactorTooSmall(g) => {
                write!(f, "retry.growth_factor must be at least 2 (got {})", g)
            }
            ValidationError::IntervalCapBelowInitial { cap, initial } => write!(
                f,
                "retry.max_interval_secs ({}) is below initial_backoff_secs ({})",
                cap, initial
            ),
            ValidationError::ZeroSettleDelay => {
                write!(f, "rejitter.initial_settle_delay_secs must be at least 1 when enabled")
            }
            ValidationError::ZeroJitterWindow => {
                write!(f, "rejitter.jitter_window_secs must be at least 1 when enabled")
            }
            ValidationError::ZeroTransportAttempts => {
                write!(f, "transport_retry.max_attempts must be at least 1")
            }
            ValidationError::EmptyQueueName => write!(f, "queue_name must not be empty"),
            ValidationError::EmptyStateDir => write!(f, "state_dir must not be empty"),
            ValidationError::BadMetricsAddress(addr) => {
                write!(f, "observability.metrics_address is not a socket address: {}", addr)
            }
        }
    }
}

/// Validate a configuration, collecting every failure rather than stopping
/// at the first.
pub fn validate_config(config: &BreakerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroMaxAttempts);
    }
    if config.retry.initial_backoff_secs == 0 {
        errors.push(ValidationError::ZeroInitialBackoff);
    }
    if config.retry.growth_factor < 2 {
        errors.push(ValidationError::GrowthFactorTooSmall(config.retry.growth_factor));
    }
    if let Some(cap) = config.retry.max_interval_secs {
        if cap < config.retry.initial_backoff_secs {
            errors.push(ValidationError::IntervalCapBelowInitial {
                cap,
                initial: config.retry.initial_backoff_secs,
            });
        }
    }

    if config.rejitter.enabled {
        if config.rejitter.initial_settle_delay_secs == 0 {
            errors.push(ValidationError::ZeroSettleDelay);
        }
        if config.rejitter.jitter_window_secs == 0 {
            errors.push(ValidationError::ZeroJitterWindow);
        }
    }

    if config.transport_retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroTransportAttempts);
    }

    if config.queue_name.trim().is_empty() {
        errors.push(ValidationError::EmptyQueueName);
    }
    if config.state_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyStateDir);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&BreakerConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_max_attempts() {
        let mut config = BreakerConfig::default();
        config.retry.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroMaxAttempts));
    }

    #[test]
    fn rejitter_checks_only_apply_when_enabled() {
        let mut config = BreakerConfig::default();
        config.rejitter.jitter_window_secs = 0;
        assert!(validate_config(&config).is_ok());

        config.rejitter.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroJitterWindow]);
    }

    #[test]
    fn rejects_cap_below_initial_interval() {
        let mut config = BreakerConfig::default();
        config.retry.max_interval_secs = Some(5);
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::IntervalCapBelowInitial { cap: 5, initial: 10 }
        ));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = BreakerConfig::default();
        config.retry.max_attempts = 0;
        config.queue_name = String::new();
        config.transport_retry.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
