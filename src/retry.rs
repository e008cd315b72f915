use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_TRANSIENT_STATUSES: [u16; 3] = [502, 503, 504];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            transient_statuses: DEFAULT_TRANSIENT_STATUSES.to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct Attempted<T> {
    pub outcome: Result<T, RetryFailure>,
    pub attempts: u32,
    /// Backoff delays slept between attempts, in order.
    pub delays: Vec<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryFailure {
    Exhausted(FetchError),
    Permanent(FetchError),
}

impl RetryFailure {
    pub fn error(&self) -> &FetchError {
        match self {
            Self::Exhausted(err) | Self::Permanent(err) => err,
        }
    }
}

impl RetryPolicy {
    pub fn is_transient(&self, err: &FetchError) -> bool {
        match err {
            FetchError::Status { status } => self.transient_statuses.contains(status),
            FetchError::Timeout
            | FetchError::Transport(_)
            | FetchError::EmptyBody
            | FetchError::MalformedPayload(_) => true,
            FetchError::EmptyTopicId => false,
        }
    }

    /// Delay slept before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.base_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.max(0.0).round() as u64)
    }

    pub async fn execute<F, Fut, T>(&self, topic_id: &str, mut operation: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut delays = Vec::new();

        loop {
            attempts += 1;
            let err = match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(topic_id, attempts, "fragment fetched after retry");
                    }
                    return Attempted {
                        outcome: Ok(value),
                        attempts,
                        delays,
                    };
                }
                Err(err) => err,
            };

            if !self.is_transient(&err) {
                tracing::debug!(topic_id, attempts, error = %err, "permanent fragment failure");
                return Attempted {
                    outcome: Err(RetryFailure::Permanent(err)),
                    attempts,
                    delays,
                };
            }

            if attempts >= max_attempts {
                tracing::debug!(topic_id, attempts, error = %err, "fragment retries exhausted");
                return Attempted {
                    outcome: Err(RetryFailure::Exhausted(err)),
                    attempts,
                    delays,
                };
            }

            let delay = self.delay_for(attempts);
            tracing::debug!(
                topic_id,
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient fragment failure; retrying"
            );
            tokio::time::sleep(delay).await;
            delays.push(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(1),
            transient_statuses: vec![502],
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for(2), Duration::from_secs(6));
        assert_eq!(policy.delay_for(3), Duration::from_secs(12));
        assert_eq!(policy.delay_for(10), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn classifies_statuses_by_configured_list() {
        let policy = fast_policy();
        assert!(policy.is_transient(&FetchError::Status { status: 502 }));
        assert!(!policy.is_transient(&FetchError::Status { status: 503 }));
        assert!(!policy.is_transient(&FetchError::Status { status: 404 }));
        assert!(policy.is_transient(&FetchError::Timeout));
        assert!(policy.is_transient(&FetchError::EmptyBody));
        assert!(!policy.is_transient(&FetchError::EmptyTopicId));
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_with_two_delays() {
        let policy = fast_policy();
        let calls = Arc::new(AtomicU32::new(0));

        let attempted = policy
            .execute("T1", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(FetchError::Status { status: 502 })
                    } else {
                        Ok("<p>ok</p>")
                    }
                }
            })
            .await;

        assert_eq!(attempted.outcome, Ok("<p>ok</p>"));
        assert_eq!(attempted.attempts, 3);
        assert_eq!(
            attempted.delays,
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_ceiling_when_always_transient() {
        let policy = fast_policy();
        let calls = Arc::new(AtomicU32::new(0));

        let attempted: Attempted<()> = policy
            .execute("T1", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Timeout)
                }
            })
            .await;

        assert_eq!(
            attempted.outcome,
            Err(RetryFailure::Exhausted(FetchError::Timeout))
        );
        assert_eq!(attempted.attempts, 4);
        assert_eq!(attempted.delays.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let policy = fast_policy();
        let calls = Arc::new(AtomicU32::new(0));

        let attempted: Attempted<()> = policy
            .execute("T1", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Status { status: 404 })
                }
            })
            .await;

        assert_eq!(
            attempted.outcome,
            Err(RetryFailure::Permanent(FetchError::Status { status: 404 }))
        );
        assert_eq!(attempted.attempts, 1);
        assert!(attempted.delays.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_ceiling_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..fast_policy()
        };
        let attempted: Attempted<()> = policy
            .execute("T1", || async { Err(FetchError::EmptyBody) })
            .await;
        assert_eq!(attempted.attempts, 1);
        assert!(attempted.delays.is_empty());
    }
}
