//! Optimistic-concurrency retry loop.
//!
//! Every mutating service operation is a read-compute-write cycle against
//! [`crate::persistence::WaitlistStore`]. When the write loses a race the
//! store returns [`GatewayError::VersionConflict`] and the whole cycle is run
//! again on a fresh snapshot. Nothing else is retried.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::domain::EventId;
use crate::error::GatewayError;

/// Default number of re-runs after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Default base backoff between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5);

/// Upper bound for the exponential backoff multiplier.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// How often and how patiently a conflicted write is re-run.
///
/// Backoff grows as `backoff * 2^(retry - 1)` (capped at `backoff * 64`)
/// with ±50 % jitter so that contending writers spread out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-runs allowed after the first attempt.
    pub max_retries: u32,
    /// Base delay before the first re-run. Zero disables sleeping.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that retries immediately. Used by tests.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    /// Total attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before re-run number `retry` (1-based), jitter included.
    fn delay(&self, retry: u32) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let shift = retry.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        let base = self.backoff.saturating_mul(1 << shift);
        base.mul_f64(rand::thread_rng().gen_range(0.5..=1.5))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are spent.
///
/// `operation` must perform a complete read-compute-write cycle on every
/// call; it is never resumed half-way.
///
/// # Errors
///
/// - Any non-retryable error from `operation`, unchanged.
/// - [`GatewayError::RetriesExhausted`] if every attempt hit a
///   [`GatewayError::VersionConflict`].
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    event_id: EventId,
    mut operation: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match operation().await {
            Err(err) if err.is_retryable() => {
                if attempt >= max_attempts {
                    tracing::warn!(%event_id, attempts = attempt, "write retries exhausted");
                    return Err(GatewayError::RetriesExhausted {
                        event_id,
                        attempts: attempt,
                    });
                }
                let delay = policy.delay(attempt);
                tracing::debug!(
                    %event_id,
                    attempt,
                    backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "version conflict, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            other => return other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::persistence::Version;

    fn conflict() -> GatewayError {
        GatewayError::VersionConflict {
            event_id: EventId::new(1),
            expected: Version::new(1),
            found: Version::new(2),
        }
    }

    #[tokio::test]
    async fn succeeds_after_conflicts() {
        let calls = AtomicU32::new(0);
        let result = retry_on_conflict(&RetryPolicy::immediate(3), EventId::new(1), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.ok(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_on_conflict(&RetryPolicy::immediate(2), EventId::new(1), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            })
            .await;
        let Err(GatewayError::RetriesExhausted { attempts, .. }) = result else {
            panic!("expected RetriesExhausted, got {result:?}");
        };
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_on_conflict(&RetryPolicy::immediate(5), EventId::new(1), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::NoWaitingEntrants(EventId::new(1)))
            })
            .await;
        assert!(matches!(result, Err(GatewayError::NoWaitingEntrants(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_is_capped_and_jittered() {
        let policy = RetryPolicy::new(10, Duration::from_millis(10));
        for retry in 1..=10 {
            let delay = policy.delay(retry);
            assert!(delay <= Duration::from_millis(10 * 64 * 3 / 2));
            assert!(delay >= Duration::from_millis(5));
        }
        assert_eq!(RetryPolicy::immediate(3).delay(1), Duration::ZERO);
    }
}
