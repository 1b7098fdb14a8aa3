//! Pure-doubling backoff for the probe retry loop.
//!
//! No jitter at this stage: the interval is fully determined by the initial
//! value and the attempt count, `interval_i = initial * growth^(i-1)`.
//! Growth is uncapped unless the optional ceiling is configured.

use std::time::Duration;

use crate::incident::Incident;

/// Outcome of a failed probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then re-probe the same unit.
    Retry(Duration),
    /// The attempt ceiling was exceeded; the incident fails.
    Exhausted,
}

/// Advance the incident past a failed probe: bump the attempt counter,
/// grow the interval, and decide retry versus terminate.
pub fn on_failure(incident: &mut Incident) -> RetryDecision {
    incident.attempt = incident.attempt.saturating_add(1);
    incident.retry_interval_secs = interval_for(
        incident.attempt,
        incident.retry.initial_backoff_secs,
        incident.retry.growth_factor,
        incident.retry.max_interval_secs,
    );

    if incident.attempt > incident.retry.max_attempts {
        RetryDecision::Exhausted
    } else {
        RetryDecision::Retry(Duration::from_secs(incident.retry_interval_secs))
    }
}

/// The retry interval for a given attempt, in seconds.
fn interval_for(attempt: u32, initial: u64, growth: u32, cap: Option<u64>) -> u64 {
    let exponent = attempt.saturating_sub(1);
    let factor = (growth as u64).saturating_pow(exponent);
    let interval = initial.saturating_mul(factor);
    match cap {
        Some(max) => interval.min(max),
        None => interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RejitterConfig, RetryConfig, TransportRetryConfig};
    use crate::incident::ProbeUnit;

    fn incident_with_retry(retry: RetryConfig) -> Incident {
        let mut incident = Incident::new(
            "consumer-a",
            "work",
            retry,
            RejitterConfig::default(),
            TransportRetryConfig::default(),
        );
        incident.record_fetch(ProbeUnit {
            body: "b".into(),
            receipt: "r".into(),
            queue: "work".into(),
        });
        incident
    }

    #[test]
    fn interval_doubles_per_failed_attempt() {
        let mut incident = incident_with_retry(RetryConfig::default());

        // After attempt i fails, the next wait is 10 * 2^(i+1-1).
        let expected = [20, 40, 80, 160, 320, 640, 1280, 2560, 5120];
        for (i, want) in expected.iter().enumerate() {
            let decision = on_failure(&mut incident);
            assert_eq!(incident.attempt, i as u32 + 2);
            assert_eq!(incident.retry_interval_secs, *want);
            assert_eq!(decision, RetryDecision::Retry(Duration::from_secs(*want)));
        }
    }

    #[test]
    fn attempt_counter_increases_by_exactly_one() {
        let mut incident = incident_with_retry(RetryConfig::default());
        for expected in 2..=10 {
            on_failure(&mut incident);
            assert_eq!(incident.attempt, expected);
        }
    }

    #[test]
    fn exceeding_max_attempts_is_exhausted() {
        let retry = RetryConfig {
            max_attempts: 3,
            ..RetryConfig::default()
        };
        let mut incident = incident_with_retry(retry);

        assert!(matches!(on_failure(&mut incident), RetryDecision::Retry(_)));
        assert!(matches!(on_failure(&mut incident), RetryDecision::Retry(_)));
        assert_eq!(on_failure(&mut incident), RetryDecision::Exhausted);
        assert_eq!(incident.attempt, 4);
    }

    #[test]
    fn optional_ceiling_caps_growth() {
        let retry = RetryConfig {
            max_interval_secs: Some(60),
            ..RetryConfig::default()
        };
        let mut incident = incident_with_retry(retry);

        on_failure(&mut incident); // 20
        on_failure(&mut incident); // 40
        on_failure(&mut incident); // 80 → capped to 60
        assert_eq!(incident.retry_interval_secs, 60);
        on_failure(&mut incident);
        assert_eq!(incident.retry_interval_secs, 60);
    }

    #[test]
    fn growth_saturates_instead_of_overflowing() {
        let retry = RetryConfig {
            max_attempts: u32::MAX,
            ..RetryConfig::default()
        };
        let mut incident = incident_with_retry(retry);
        incident.attempt = 200;

        let decision = on_failure(&mut incident);
        assert_eq!(incident.retry_interval_secs, u64::MAX);
        assert!(matches!(decision, RetryDecision::Retry(_)));
    }
}
