//! Gateway error types.
//!
//! Every failure on the way to a downstream ends up here and is turned into
//! a JSON response with a stable `reason` string, so clients can tell a
//! missing registration from an open circuit.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::domain::Domain;
use crate::http::GatewayErrorBody;

/// Error type for gateway dispatch.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The route names no known domain.
    #[error("unknown service '{0}'")]
    UnknownService(String),

    /// The path carries a `.` or `..` segment.
    #[error("invalid path '{path}'")]
    InvalidPath { service: String, path: String },

    /// The registry has no entry for the domain.
    #[error("{service} is not registered")]
    ServiceNotFound { service: Domain },

    /// The registry could not be asked.
    #[error("registry unavailable: {detail}")]
    RegistryUnavailable { service: Domain, detail: String },

    /// The breaker for the domain is fencing calls.
    #[error("circuit open for {service}")]
    CircuitOpen { service: Domain },

    /// The resolved address did not answer.
    #[error("{service} unreachable: {detail}")]
    DownstreamUnreachable { service: Domain, detail: String },

    /// The resolved address answered with a non-success status.
    #[error("{service} answered with status {status}")]
    DownstreamError { service: Domain, status: u16 },

    /// The resolved address answered 2xx with a body that is not JSON.
    #[error("{service} returned an invalid payload: {detail}")]
    InvalidPayload { service: Domain, detail: String },

    /// The call did not finish within its deadline.
    #[error("{service} did not answer within {timeout_ms} ms")]
    Timeout { service: Domain, timeout_ms: u64 },
}

impl GatewayError {
    /// Stable failure category reported to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "unknown service",
            Self::InvalidPath { .. } => "invalid path",
            Self::ServiceNotFound { .. } => "service not found",
            Self::RegistryUnavailable { .. } => "registry unavailable",
            Self::CircuitOpen { .. } => "circuit open",
            Self::DownstreamUnreachable { .. } => "downstream unreachable",
            Self::DownstreamError { .. } => "downstream error",
            Self::InvalidPayload { .. } => "invalid downstream payload",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// HTTP status returned to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownService(_) => StatusCode::NOT_FOUND,
            Self::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            Self::ServiceNotFound { .. }
            | Self::RegistryUnavailable { .. }
            | Self::CircuitOpen { .. }
            | Self::DownstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::DownstreamError { .. } | Self::InvalidPayload { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Route segment of the targeted service.
    pub fn service(&self) -> String {
        match self {
            Self::UnknownService(name) | Self::InvalidPath { service: name, .. } => name.clone(),
            Self::ServiceNotFound { service }
            | Self::RegistryUnavailable { service, .. }
            | Self::CircuitOpen { service }
            | Self::DownstreamUnreachable { service, .. }
            | Self::DownstreamError { service, .. }
            | Self::InvalidPayload { service, .. }
            | Self::Timeout { service, .. } => service.to_string(),
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "unknown_service",
            Self::InvalidPath { .. } => "invalid_path",
            Self::ServiceNotFound { .. } => "not_found",
            Self::RegistryUnavailable { .. } => "registry_unavailable",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::DownstreamUnreachable { .. } => "unreachable",
            Self::DownstreamError { .. } => "downstream_error",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::Timeout { .. } => "timeout",
        }
    }

    pub fn to_body(&self) -> GatewayErrorBody {
        GatewayErrorBody {
            reason: self.reason().to_string(),
            service: self.service(),
            detail: self.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
