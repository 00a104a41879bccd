//! Bounded retry with exponential backoff
//!
//! | Fault | Action |
//! |-------|--------|
//! | Timeout / connect / reset / truncated body | Retry |
//! | HTTP 5xx | Retry |
//! | HTTP 4xx | Propagate immediately |
//! | Malformed payload, precondition failure | Propagate immediately |
//!
//! The delay before retry `n` (0-indexed) is `base_delay * 2^n`. There is no
//! jitter, so a given failure sequence always produces the same schedule.

use crate::InkfeedError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Fault classification consumed by [`with_retry`]
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for InkfeedError {
    fn is_retryable(&self) -> bool {
        InkfeedError::is_retryable(self)
    }
}

/// How many times, and how patiently, to repeat a failing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable fault, or the
/// retry budget is spent
///
/// # Arguments
///
/// * `policy` - Retry budget and backoff base
/// * `label` - Short description of the operation, used in log lines
/// * `op` - Zero-argument operation producing a fresh future per attempt
///
/// # Returns
///
/// The first success, the first non-retryable fault, or the last fault once
/// `policy.max_retries` retries have been used.
///
/// # Example
///
/// ```no_run
/// use inkfeed::fetch::{get_json, with_retry, RetryPolicy};
///
/// # async fn demo(client: &reqwest::Client) -> inkfeed::Result<()> {
/// let ids: Vec<u64> = with_retry(&RetryPolicy::default(), "top stories", || {
///     get_json(client, "https://hacker-news.firebaseio.com/v0/topstories.json", &[])
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                debug!(
                    op = label,
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    ?delay,
                    error = %e,
                    "Retrying after transient failure"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
