//! Bounded retry for transient provider failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::context::CallContext;
use crate::error::{GenerationError, Result};

/// Exponential backoff settings.
///
/// Only errors that report themselves retryable (network failures, 429,
/// 5xx) are retried. Request and schema errors fail immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 1 disables retries.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay after the `failed`-th failed attempt (1-based).
    pub fn delay_for(&self, failed: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    ctx: &CallContext,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match ctx.guard(op()).await.map_err(GenerationError::from)? {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient provider failure, retrying"
                );
                ctx.guard(tokio::time::sleep(delay))
                    .await
                    .map_err(GenerationError::from)?;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
