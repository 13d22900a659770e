//! Retry policy for individual store calls.

use crate::error::StoreError;
use crate::store::with_timeout;
use crate::transfer::cancel::CancelFlag;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many times a transfer is attempted and how long to wait in between.
///
/// The delay after the n-th failed attempt is `base_delay * 2^(n-1)` capped at
/// `max_delay`. With `jitter`, up to half of that delay is added on top (still
/// capped). A server-provided `Retry-After` replaces the computed delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

/// A call that failed for good.
#[derive(Debug, Clone)]
pub struct RetryFailure {
    pub error: StoreError,
    pub attempts: u32,
    /// Retrying stopped because the cancel flag was raised.
    pub cancelled: bool,
}

impl RetryFailure {
    /// A failure outside the retried call, e.g. preparing a staging file.
    pub fn single(error: StoreError) -> Self {
        Self {
            error,
            attempts: 1,
            cancelled: false,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before the next attempt after `failed_attempts` failures.
    pub fn delay_for(&self, failed_attempts: u32, error: &StoreError) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after.min(self.max_delay);
        }
        let exponent = failed_attempts.saturating_sub(1).min(16);
        let base = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let factor: f64 = rand::thread_rng().gen_range(0.0..0.5);
        (base + base.mul_f64(factor)).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// runs out of attempts, or `cancel` is raised. Every attempt is bounded by
    /// `timeout`; a raised flag cuts the backoff sleep short.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        timeout: Duration,
        cancel: &CancelFlag,
        mut operation: F,
    ) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match with_timeout(timeout, operation()).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    if cancel.is_cancelled() {
                        return Err(RetryFailure {
                            error,
                            attempts: attempt,
                            cancelled: true,
                        });
                    }
                    let delay = self.delay_for(attempt, &error);
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = cancel.cancelled() => {
                                return Err(RetryFailure {
                                    error,
                                    attempts: attempt,
                                    cancelled: true,
                                });
                            }
                        }
                    }
                }
                Err(error) => {
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                        cancelled: false,
                    })
                }
            }
        }
    }
}
