//! Bounded retry with a fixed delay.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times
//! - Sleep a fixed delay between failed attempts
//! - Report either the value and attempts used, or the last error
//!
//! # Design Decisions
//! - No sleep after the final attempt
//! - The outcome is always returned; callers decide whether to care

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetriesExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number. On success returns the
/// value together with the number of attempts used.
pub async fn retry_fixed<F, Fut, T, E>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<(T, u32), RetriesExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay = ?policy.delay,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(RetriesExhausted {
                    attempts: attempt,
                    last_error: e,
                })
            }
        }
    }
}
