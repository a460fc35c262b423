use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Bounded-attempt retry with a fixed delay between attempts.
///
/// Exhaustion is surfaced as an explicit [`RetryOutcome::SkippedAfterRetries`]
/// variant rather than an error: callers run best-effort batches and must
/// branch on the outcome to decide whether to continue with the next item.
#[derive(Clone, Debug)]
pub(crate) struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

#[derive(Debug, PartialEq)]
pub(crate) enum RetryOutcome<T> {
    Ok(T),
    SkippedAfterRetries,
}

impl<T> RetryOutcome<T> {
    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            RetryOutcome::Ok(value) => Some(value),
            RetryOutcome::SkippedAfterRetries => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub(crate) fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub(crate) async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        // A zero-attempt policy must never invoke the operation.
        if self.attempts == 0 {
            warn!(label, "Retry policy has zero attempts, skipping operation");
            return RetryOutcome::SkippedAfterRetries;
        }

        for attempt in 1..=self.attempts {
            match operation().await {
                Ok(value) => return RetryOutcome::Ok(value),
                Err(error) if attempt < self.attempts => {
                    warn!(%error, label, attempt, "Operation failed, retrying after delay");
                    tokio::time::sleep(self.delay).await;
                }
                Err(error) => {
                    error!(%error, label, attempts = self.attempts, "Operation failed, no attempts left");
                }
            }
        }

        RetryOutcome::SkippedAfterRetries
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryOutcome, RetryPolicy};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[actix_rt::test]
    async fn should_return_value_on_first_success() {
        let calls = AtomicU32::new(0);

        let outcome = policy(3)
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, std::io::Error>(42) }
            })
            .await;

        assert_eq!(outcome, RetryOutcome::Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn should_retry_until_success() {
        let calls = AtomicU32::new(0);

        let outcome = policy(3)
            .run("op", || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt <= 2 {
                        Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(outcome, RetryOutcome::Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[actix_rt::test]
    async fn should_skip_after_exhausting_attempts() {
        let calls = AtomicU32::new(0);

        let outcome = policy(3)
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(std::io::Error::new(std::io::ErrorKind::Other, "boom")) }
            })
            .await;

        assert_eq!(outcome, RetryOutcome::SkippedAfterRetries);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[actix_rt::test]
    async fn should_never_invoke_operation_with_zero_attempts() {
        let calls = AtomicU32::new(0);

        let outcome = policy(0)
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, std::io::Error>(()) }
            })
            .await;

        assert_eq!(outcome, RetryOutcome::SkippedAfterRetries);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn into_option_maps_both_variants() {
        assert_eq!(RetryOutcome::Ok(1).into_option(), Some(1));
        assert_eq!(RetryOutcome::<u32>::SkippedAfterRetries.into_option(), None);
    }
}
