//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through, failures counted
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: one trial call tests whether the downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: reset timeout elapsed since opening
//! Half-Open → Closed: trial call succeeds (counter reset)
//! Half-Open → Open: trial call fails (timer restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per protected downstream, shared by all request tasks
//! - Fail fast in Open state; the operation is never invoked
//! - Single trial in Half-Open; concurrent callers keep failing fast
//! - The state lock is never held across the awaited operation

use serde::Serialize;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Outcome of a guarded call that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    /// The circuit is open; the operation was not attempted.
    #[error("circuit open")]
    Open,

    /// The operation ran and failed.
    #[error("{0}")]
    Inner(E),
}

/// Point-in-time view of a breaker, for status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Consecutive-failure circuit breaker guarding one downstream.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Current state and failure count.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }

    /// Run `operation` under the breaker.
    ///
    /// Returns [`BreakerError::Open`] without calling `operation` while the
    /// circuit is open. Any `Err` from the operation counts as a failure.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = match self.acquire() {
            Some(permit) => permit,
            None => {
                tracing::debug!(downstream = %self.name, "Circuit open, failing fast");
                return Err(BreakerError::Open);
            }
        };

        let outcome = operation().await;
        match outcome {
            Ok(value) => {
                permit.succeed();
                Ok(value)
            }
            Err(e) => {
                permit.fail();
                Err(BreakerError::Inner(e))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a call may proceed.
    fn acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Some(Permit::new(self, false)),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.reset_timeout)
                    .unwrap_or(true);
                if !elapsed {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                tracing::info!(downstream = %self.name, "Circuit half-open, allowing trial call");
                metrics::record_breaker_state(&self.name, CircuitState::HalfOpen);
                Some(Permit::new(self, true))
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return None;
                }
                inner.trial_in_flight = true;
                Some(Permit::new(self, true))
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;

        if previous != CircuitState::Closed {
            tracing::info!(downstream = %self.name, "Circuit closed");
            metrics::record_breaker_state(&self.name, CircuitState::Closed);
        }
    }

    fn on_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trial_failed = inner.state == CircuitState::HalfOpen;
        let should_open = trial_failed
            || (inner.state == CircuitState::Closed
                && inner.consecutive_failures >= self.failure_threshold);

        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.trial_in_flight = false;
            tracing::warn!(
                downstream = %self.name,
                consecutive_failures = inner.consecutive_failures,
                reset_timeout = ?self.reset_timeout,
                "Circuit opened"
            );
            metrics::record_breaker_state(&self.name, CircuitState::Open);
        }
    }

    /// A trial was abandoned before it completed.
    fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }
}

/// Admission to run one guarded call.
///
/// A trial permit dropped without an outcome (the caller's future was
/// cancelled) frees the half-open slot for the next caller.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success();
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.release_trial();
        }
    }
}
