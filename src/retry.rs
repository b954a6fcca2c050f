//! Bounded retries for resource fetches.
//!
//! The page is waiting on these, so delays stay short: a doubling backoff
//! starting at `first_delay` and capped at `max_delay`.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included. Zero still makes one attempt.
    pub max_attempts: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// 250ms, 500ms, 1s, 1s, ...
    pub fn for_assets(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            first_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Pause before retry number `retry` (1 for the first retry).
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.first_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_assets(2)
    }
}

/// Run `operation` until it succeeds, fails with an error `retryable`
/// rejects, or the policy runs out of attempts.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
    retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !retryable(&error) {
            return Err(error);
        }
        if attempt >= attempts {
            warn!("{}: giving up after {} attempts: {}", label, attempts, error);
            return Err(error);
        }

        let pause = policy.backoff(attempt);
        debug!(
            "{}: attempt {}/{} failed ({}), retrying in {:?}",
            label, attempt, attempts, error, pause
        );
        sleep(pause).await;
        attempt += 1;
    }
}
