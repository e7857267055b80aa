//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): gateway calls by service and outcome
//! - `gateway_request_duration_seconds` (histogram): latency per service
//! - `gateway_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `registry_registrations_total` (counter): accepted registrations
//! - `registration_attempts_total` (counter): self-registration attempts by result
//! - `service_requests_total` (counter): domain service requests by endpoint and status
//! - `service_request_duration_seconds` (histogram): domain service latency per endpoint
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is opt-in via `observability.metrics_enabled`

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one gateway dispatch.
pub fn record_request(service: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a breaker state change.
pub fn record_breaker_state(downstream: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("gateway_breaker_state", "downstream" => downstream.to_string()).set(value);
}

/// Record a registration accepted by the registry.
pub fn record_registration(service: &str) {
    metrics::counter!("registry_registrations_total", "service" => service.to_string())
        .increment(1);
}

/// Record one self-registration attempt.
pub fn record_registration_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("registration_attempts_total", "result" => result).increment(1);
}

/// Record one request answered by a domain service.
pub fn record_service_request(
    service: &'static str,
    endpoint: &'static str,
    status: u16,
    start: Instant,
) {
    metrics::counter!(
        "service_requests_total",
        "service" => service,
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "service_request_duration_seconds",
        "service" => service,
        "endpoint" => endpoint
    )
    .record(start.elapsed().as_secs_f64());
}
