//! Exponential-backoff retry policy.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Retry policy with exponential backoff and optional jitter.
///
/// The policy only computes scheduling; which errors are worth retrying is
/// the caller's decision, passed as a predicate to [`RetryPolicy::execute`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Set the jitter factor (0.0 = deterministic, 1.0 = full jitter).
    #[must_use]
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry following attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_millis = self.base_delay.as_millis() as u64;
        let max_millis = self.max_delay.as_millis() as u64;

        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let delay_millis =
            base_millis.saturating_mul(2_u64.saturating_pow(exponent)).min(max_millis);

        self.apply_jitter(Duration::from_millis(delay_millis))
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor == 0.0 {
            return delay;
        }
        let delay_millis = delay.as_millis() as f64;
        let jitter_range = delay_millis * self.jitter_factor;
        let jitter = rand::thread_rng().gen_range(-jitter_range / 2.0..=jitter_range / 2.0);
        Duration::from_millis((delay_millis + jitter).max(0.0) as u64)
    }

    /// Run `operation` up to `max_attempts` times, sleeping between attempts.
    ///
    /// `is_retryable` gates every retry; a non-retryable error is returned
    /// immediately. The last error is returned when attempts are exhausted.
    pub async fn execute<F, Fut, T, E>(
        &self,
        operation_name: &str,
        is_retryable: impl Fn(&E) -> bool,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, attempts = attempt + 1, "retry succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let last_attempt = attempt + 1 >= self.max_attempts;
                    if last_attempt || !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
