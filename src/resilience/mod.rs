//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway call to a downstream:
//!     → circuit_breaker.rs (fail fast while open, track consecutive failures)
//!
//! Domain service startup:
//!     → retries.rs (bounded attempts, fixed delay)
//! ```
//!
//! # Design Decisions
//! - Breakers wrap an operation passed as a value, no implicit interception
//! - Breaker state is an explicit object owned by the gateway

pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use retries::{retry_fixed, RetriesExhausted, RetryPolicy};
