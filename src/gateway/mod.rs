//! API gateway subsystem.
//!
//! # Data Flow
//! ```text
//! GET /{service}/{*path}
//!     → server.rs (domain segment parsed, unknown → 404)
//!     → dispatcher.rs (registry lookup, fresh every request)
//!     → resilience::circuit_breaker (when configured for the domain)
//!     → downstream GET, status + JSON validated
//!     → error.rs on any failure ({reason, service, detail})
//!
//! GET /city/zone/{zone_id}
//!     → fanout.rs (one dispatch per domain, concurrently, each with a deadline)
//!     → merged {zone_id, data, errors}
//! ```

pub mod dispatcher;
pub mod error;
pub mod fanout;
pub mod server;

pub use dispatcher::Dispatcher;
pub use error::GatewayError;
pub use fanout::{aggregate_zone, ServiceFailure, ZoneReport};
pub use server::GatewayServer;
