//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every server stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per process, every server subscribes
//! - The registration task is not cancelled; it is bounded on its own

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
