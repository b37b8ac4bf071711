//! Bounded retry of provider calls with exponential backoff

use std::{future::Future, time::Duration};

use banana_config::RetryConfig;

use crate::{classify::classify, error::ProviderError, result::Failure};

/// Retry policy applied around a single provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// At least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after a failed `attempt` (1-based): `base * 2^(attempt - 1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Invoke `call` until it succeeds, fails with a non-retryable kind, or
    /// the attempt budget is spent
    ///
    /// `call` receives the 1-based attempt number. Every error is classified;
    /// the last classified failure is returned when attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the final attempt
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, Failure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;

        loop {
            let error = match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let failure = classify(&error);

            if !failure.retryable {
                tracing::debug!(attempt, kind = %failure.kind, "provider call failed, not retryable");
                return Err(failure);
            }

            if attempt >= self.max_attempts {
                tracing::warn!(
                    attempts = attempt,
                    kind = %failure.kind,
                    detail = failure.detail.as_deref().unwrap_or_default(),
                    "provider call failed, retries exhausted"
                );
                return Err(failure);
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                kind = %failure.kind,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "provider call failed, retrying"
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
