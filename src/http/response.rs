//! Response helpers shared by every role.
//!
//! The registry and the domain services answer errors FastAPI-style with a
//! `{"detail": ...}` body; the gateway adds a machine-readable `reason`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body produced by the registry and domain services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailBody {
    pub detail: String,
}

/// Build an error response with a `detail` message.
pub fn detail_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(DetailBody { detail: detail.into() })).into_response()
}

/// Error body produced by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayErrorBody {
    /// Stable failure category, e.g. `circuit open`.
    pub reason: String,
    /// Domain the request targeted.
    pub service: String,
    pub detail: String,
}
