//! HTTP plumbing shared by all roles.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, common layers, graceful shutdown)
//!     → request.rs (request ID assigned and echoed)
//!     → role router (registry, gateway or domain service)
//!     → response.rs (error bodies)
//!
//! Outbound calls (registry lookups, downstream requests):
//!     → client.rs (reqwest client with connect/request timeouts)
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::build_client;
pub use request::{request_id, X_REQUEST_ID};
pub use response::{detail_response, DetailBody, GatewayErrorBody};
pub use server::{serve, with_common_layers};
