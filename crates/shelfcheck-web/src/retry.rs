//! Bounded retry with a fixed backoff.

use crate::{Error, Result};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryBudget {
    /// Total invocations, including the first.
    #[serde(alias = "attempts")]
    pub max_attempts: u32,

    #[serde(alias = "delay_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryBudget {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff_ms: u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// budget runs out. The last transient error is returned on exhaustion.
pub async fn retry_on<T, F, Fut, P>(
    budget: &RetryBudget,
    what: &str,
    is_transient: P,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let attempts = budget.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt < attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}ms",
                    what, attempt, attempts, e, budget.backoff_ms
                );
                tokio::time::sleep(budget.backoff()).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// [`retry_on`] for stale element references only.
pub async fn with_stale_retry<T, F, Fut>(budget: &RetryBudget, what: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_on(budget, what, Error::is_stale, op).await
}
