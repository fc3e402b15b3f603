//! Bounded retry with exponential backoff around a single async call

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::Result;

/// Retry settings for one outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Sleep after the zero-based attempt `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// The closure receives the zero-based attempt index. Only errors for which
    /// [`AppError::is_retryable`](crate::error::AppError::is_retryable) holds are
    /// retried; everything else is returned at once.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                warn!(
                    request = %label,
                    attempt = attempt + 1,
                    error = %err,
                    "Request failed with a non-retryable error"
                );
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                error!(
                    request = %label,
                    attempts = max_attempts,
                    error = %err,
                    "Request failed after all retries"
                );
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                request = %label,
                attempt = attempt + 1,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, backing off before retry"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
