//! Request identification.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Echo the ID back on the response
//! - Expose the ID so outbound calls can carry it downstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An ID supplied by the client is kept as-is

use axum::http::HeaderMap;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Read the request ID from a header map.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}
