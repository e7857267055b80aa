//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//! - Check that addresses and URLs parse
//! - Detect duplicate breaker definitions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MeshConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::MeshConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MeshConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "registry.bind_address", &config.registry.bind_address);
    check_socket_addr(&mut errors, "gateway.bind_address", &config.gateway.bind_address);
    check_socket_addr(&mut errors, "service.bind_address", &config.service.bind_address);

    check_url(&mut errors, "gateway.registry_url", &config.gateway.registry_url);
    check_url(&mut errors, "registration.registry_url", &config.registration.registry_url);
    if let Some(advertise) = &config.service.advertise_url {
        check_url(&mut errors, "service.advertise_url", advertise);
    }

    if config.gateway.fanout_timeout_ms == 0 {
        errors.push(ValidationError::new("gateway.fanout_timeout_ms", "must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for (i, breaker) in config.gateway.breakers.iter().enumerate() {
        let field = format!("gateway.breakers[{}]", i);
        if !seen.insert(breaker.service) {
            errors.push(ValidationError::new(
                format!("{}.service", field),
                format!("duplicate breaker for '{}'", breaker.service),
            ));
        }
        if breaker.failure_threshold == 0 {
            errors.push(ValidationError::new(
                format!("{}.failure_threshold", field),
                "must be greater than 0",
            ));
        }
        if breaker.reset_timeout_secs == 0 {
            errors.push(ValidationError::new(
                format!("{}.reset_timeout_secs", field),
                "must be greater than 0",
            ));
        }
    }

    if config.registration.max_attempts == 0 {
        errors.push(ValidationError::new("registration.max_attempts", "must be greater than 0"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", value)));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}
