//! Bounded retry loop shared by feed fetches, registry reads, builds and pushes

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::{
    BUILD_MAX_ATTEMPTS, BUILD_RETRY_DELAY_SECS, NETWORK_MAX_ATTEMPTS, NETWORK_RETRY_BASE_SECS,
    PUSH_MAX_ATTEMPTS, PUSH_RETRY_STEP_SECS,
};

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt
    Fixed(Duration),
    /// `step * attempt`
    Linear(Duration),
    /// `base * 2^(attempt - 1)`
    Exponential(Duration),
}

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Upstream feeds and registry tag listings: 10 attempts, 1s doubling
    pub const fn network() -> Self {
        Self {
            max_attempts: NETWORK_MAX_ATTEMPTS,
            backoff: Backoff::Exponential(Duration::from_secs(NETWORK_RETRY_BASE_SECS)),
        }
    }

    /// Image builds: 5 attempts, fixed 30s
    pub const fn build() -> Self {
        Self {
            max_attempts: BUILD_MAX_ATTEMPTS,
            backoff: Backoff::Fixed(Duration::from_secs(BUILD_RETRY_DELAY_SECS)),
        }
    }

    /// Image pushes: 5 attempts, `attempt` seconds
    pub const fn push() -> Self {
        Self {
            max_attempts: PUSH_MAX_ATTEMPTS,
            backoff: Backoff::Linear(Duration::from_secs(PUSH_RETRY_STEP_SECS)),
        }
    }

    /// Same attempt count with no delay, for tests
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    /// Delay after the failed `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Exponential(base) => {
                base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            }
        }
    }

    /// Run `op` until it succeeds, fails with an error `should_retry` rejects,
    /// or `max_attempts` is reached. The last error is returned unchanged.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && should_retry(&e) => {
                    let delay = self.delay(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {}s ...",
                        label,
                        attempt,
                        self.max_attempts,
                        e,
                        delay.as_secs()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
