//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Domain service startup:
//!     registration.rs (bounded retries)
//!     → client.rs POST /register
//!     → server.rs → store.rs (overwrite name → url)
//!
//! Gateway request:
//!     client.rs GET /discover/{name}
//!     → server.rs → store.rs (lookup, 404 on miss)
//! ```
//!
//! # Design Decisions
//! - One URL per name, last write wins
//! - No TTL, no health checks, no persistence
//! - The store is owned by the registry server, not a global

pub mod client;
pub mod registration;
pub mod server;
pub mod store;
pub mod types;

pub use client::{DiscoveryError, RegistryClient};
pub use registration::{register_with_retry, RegistrationError};
pub use server::RegistryServer;
pub use store::{RegistryError, RegistryStore};
pub use types::{Discovery, RegisterAck, Registration};
