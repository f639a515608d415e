//! Retry logic for API calls with exponential backoff and jitter.

use log::{debug, warn};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, Result};

/// Number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Longest server-requested `Retry-After` the policy is willing to wait for.
pub const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retry_after: Duration,
    /// Total time budget for one logical call, waits included.
    pub max_elapsed: Option<Duration>,
    pub jitter: bool,
    /// Whether a non-idempotent call is re-sent after a network failure,
    /// when the server may already have applied it.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
            max_elapsed: None,
            jitter: true,
            retry_non_idempotent: false,
        }
    }
}

/// Bookkeeping for one logical call. Lives on the stack of [`RetryPolicy::run`].
struct RetryState {
    attempt: u32,
    started: Instant,
    last_error: Option<ApiError>,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            started: Instant::now(),
            last_error: None,
        }
    }

    fn into_exhausted(self) -> ApiError {
        let last = self
            .last_error
            .unwrap_or_else(|| ApiError::network("no attempt was made"));
        ApiError::RetriesExhausted {
            attempts: self.attempt,
            last: Box::new(last),
        }
    }
}

impl RetryPolicy {
    /// A policy that never re-attempts.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_max_retry_after(mut self, limit: Duration) -> Self {
        self.max_retry_after = limit;
        self
    }

    pub fn with_max_elapsed(mut self, budget: Duration) -> Self {
        self.max_elapsed = Some(budget);
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn with_retry_non_idempotent(mut self, retry: bool) -> Self {
        self.retry_non_idempotent = retry;
        self
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`, plus up to 10% jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let exponential = 2u64.saturating_pow(retry - 1);
        let capped = base_ms.saturating_mul(exponential).min(max_ms);

        let jitter_range = capped / 10;
        let jitter = if self.jitter && jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// runs out of retries, or `cancel` fires.
    pub async fn run<F, Fut, T>(
        &self,
        operation_name: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with(operation_name, true, cancel, operation).await
    }

    /// Like [`run`](Self::run). If `idempotent` is false, a network failure
    /// ends the call unless `retry_non_idempotent` is set.
    pub async fn run_with<F, Fut, T>(
        &self,
        operation_name: &str,
        idempotent: bool,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut state = RetryState::new();

        loop {
            state.attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("{}: cancelled during attempt {}", operation_name, state.attempt);
                    return Err(ApiError::Cancelled);
                }
                outcome = operation() => outcome,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable() {
                debug!("{}: non-retryable error: {}", operation_name, error);
                return Err(error);
            }

            if !idempotent
                && !self.retry_non_idempotent
                && matches!(error, ApiError::Network { .. })
            {
                warn!(
                    "{}: not re-sending after a network error, the server may have applied it: {}",
                    operation_name, error
                );
                return Err(error);
            }

            if let Some(retry_after) = error.retry_after() {
                if retry_after > self.max_retry_after {
                    warn!(
                        "{}: server asked to wait {}s, more than the allowed {}s",
                        operation_name,
                        retry_after.as_secs(),
                        self.max_retry_after.as_secs()
                    );
                    return Err(error);
                }
            }

            let retry = state.attempt;
            let delay = match error.retry_after() {
                Some(retry_after) => self.backoff(retry).max(retry_after),
                None => self.backoff(retry),
            };

            let over_budget = self
                .max_elapsed
                .is_some_and(|budget| state.started.elapsed() + delay > budget);

            if retry > self.max_retries || over_budget {
                state.last_error = Some(error);
                let exhausted = state.into_exhausted();
                debug!("{}: {}", operation_name, exhausted);
                return Err(exhausted);
            }

            warn!(
                "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                operation_name,
                state.attempt,
                self.max_retries + 1,
                error,
                delay.as_millis()
            );
            state.last_error = Some(error);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("{}: cancelled while backing off", operation_name);
                    return Err(ApiError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
