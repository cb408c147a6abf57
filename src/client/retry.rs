use std::time::Duration;

use reqwest_retry::{
    policies::ExponentialBackoff, Jitter, Retryable, RetryableStrategy,
    RetryTransientMiddleware,
};
use tracing::warn;

use crate::config::EnvironmentConfig;

/// Upper bound for a single wait between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// How often and how patiently a request is retried.
///
/// `max_attempts` counts the first try, so a policy built from `retries: 2`
/// sends a request at most twice. Only transport failures are retried; an
/// HTTP response of any status ends the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_seed: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_seed: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_seed: backoff_seed.min(MAX_BACKOFF),
            max_backoff: MAX_BACKOFF,
        }
    }

    pub fn from_environment(env: &EnvironmentConfig) -> Self {
        Self::new(env.retries, env.retry_backoff)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_attempts - 1
    }

    /// The wait schedule: exponential from the seed, bounded jitter, capped.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.backoff_seed, self.max_backoff)
            .jitter(Jitter::Bounded)
            .build_with_max_retries(self.max_retries())
    }

    pub fn classify(
        &self,
        result: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        TransportOnly.handle(result)
    }

    /// Attempts spent before `err` surfaced. Fatal errors end the loop on
    /// the first try.
    pub fn attempts_for(&self, err: &reqwest_middleware::Error) -> u32 {
        if is_transient(err) {
            self.max_attempts
        } else {
            1
        }
    }

    pub(crate) fn middleware(&self) -> RetryTransientMiddleware<ExponentialBackoff, TransportOnly> {
        RetryTransientMiddleware::new_with_policy_and_strategy(self.backoff(), TransportOnly)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(200))
    }
}

/// Retries failed sends, never responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportOnly;

impl RetryableStrategy for TransportOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        let Err(err) = res else {
            return None;
        };
        if is_transient(err) {
            warn!(error = %err, "transport failure, request may be retried");
            Some(Retryable::Transient)
        } else {
            Some(Retryable::Fatal)
        }
    }
}

// Builder errors mean nothing was sent; middleware errors come from our own stack.
fn is_transient(err: &reqwest_middleware::Error) -> bool {
    matches!(err, reqwest_middleware::Error::Reqwest(inner) if !inner.is_builder())
}
