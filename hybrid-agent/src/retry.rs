//! Retry policy for hub calls.
//!
//! Calls that fail with `UNAVAILABLE` are retried with exponential backoff
//! and jitter. Every other status is returned to the caller unchanged.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tonic::{Code, Status};
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_RETRY_BACKOFF_MULTIPLIER, DEFAULT_RETRY_INITIAL_BACKOFF_SECS,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_BACKOFF_SECS,
};

/// Backoff settings for hub calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Cap applied after jitter.
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs_f64(DEFAULT_RETRY_INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs_f64(DEFAULT_RETRY_MAX_BACKOFF_SECS),
            multiplier: DEFAULT_RETRY_BACKOFF_MULTIPLIER,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64());

        let secs = if self.jitter {
            let factor = rand::rng().random_range(0.5..1.5);
            (capped * factor).min(self.max_backoff.as_secs_f64())
        } else {
            capped
        };
        Duration::from_secs_f64(secs)
    }

    /// Run `call` until it succeeds, fails with a non-retryable status, or
    /// the attempts are used up.
    pub async fn run<F, Fut, T>(&self, method: &str, mut call: F) -> Result<T, Status>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(method, attempts = attempt + 1, "Hub call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(status) if status.code() == Code::Unavailable && attempt + 1 < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        method,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %status,
                        ?delay,
                        "Hub unavailable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(status) => return Err(status),
            }
        }
    }
}
