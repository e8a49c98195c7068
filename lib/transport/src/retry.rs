//! Bounded retry of a single call.
//!
//! Rate-limited (429) and server (5xx except 501) failures are retried.
//! Everything else propagates on the first failure.

use crate::error::TransportError;
use crate::retry_after::RetryAfter;
use chrono::{DateTime, Utc};
use fgakit_core::ValidationError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Upper bound accepted for `max_retries`.
pub const MAX_ALLOWED_RETRIES: u32 = 15;
/// Default base delay for exponential backoff.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(100);
/// Default cap on any single delay.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Retry behaviour for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero means a single attempt.
    pub max_retries: u32,
    /// Base delay, doubled on each attempt.
    pub min_wait: Duration,
    /// Cap applied to every delay, hinted or computed.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(max_retries: u32, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_retries,
            min_wait,
            max_wait,
        }
    }

    /// Checks that `max_retries` is within bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] above [`MAX_ALLOWED_RETRIES`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_retries > MAX_ALLOWED_RETRIES {
            return Err(ValidationError::OutOfRange {
                field: "max_retries",
                value: u64::from(self.max_retries),
                max: u64::from(MAX_ALLOWED_RETRIES),
            });
        }
        Ok(())
    }

    /// Exponential backoff for the given zero-based attempt, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.min_wait.saturating_mul(factor).min(self.max_wait)
    }

    /// Delay before retrying after `attempt`, preferring a usable server hint.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, hint: Option<&str>, now: DateTime<Utc>) -> Duration {
        match hint.and_then(RetryAfter::parse) {
            Some(retry_after) => retry_after.delay_from(now).min(self.max_wait),
            None => self.backoff(attempt),
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or retries run out.
///
/// The final error is returned unchanged.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= policy.max_retries => {
                debug!(attempts = attempt + 1, error = %err, "retries exhausted");
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt, err.retry_after(), Utc::now());
                warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    status = err.status(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
