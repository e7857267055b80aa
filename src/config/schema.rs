//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mesh.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::Domain;

/// Root configuration shared by the registry, the gateway and the domain services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MeshConfig {
    /// Service registry settings.
    pub registry: RegistryConfig,

    /// API gateway settings.
    pub gateway: GatewayConfig,

    /// Self-registration settings used by domain services.
    pub registration: RegistrationConfig,

    /// Simulated domain service settings.
    pub service: ServiceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Registry listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the service registry.
    pub registry_url: String,

    /// Domains queried by the zone aggregation endpoint.
    pub domains: Vec<Domain>,

    /// Per-call timeout for the zone aggregation endpoint, in milliseconds.
    pub fanout_timeout_ms: u64,

    /// Downstreams protected by a circuit breaker.
    pub breakers: Vec<BreakerConfig>,
}

impl GatewayConfig {
    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_millis(self.fanout_timeout_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            registry_url: "http://127.0.0.1:8000".to_string(),
            domains: Domain::ALL.to_vec(),
            fanout_timeout_ms: 4000,
            breakers: vec![BreakerConfig::default()],
        }
    }
}

/// Circuit breaker settings for one downstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakerConfig {
    /// Downstream domain the breaker guards.
    pub service: Domain,

    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial call is let through.
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            service: Domain::Traffic,
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_reset_timeout_secs() -> u64 {
    10
}

/// Self-registration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Base URL of the service registry.
    pub registry_url: String,

    /// Maximum number of registration attempts.
    pub max_attempts: u32,

    /// Fixed delay between failed attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl RegistrationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://127.0.0.1:8000".to_string(),
            max_attempts: 5,
            retry_delay_ms: 2000,
        }
    }
}

/// Simulated domain service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address (e.g., "0.0.0.0:8001").
    pub bind_address: String,

    /// URL other processes use to reach this service.
    /// Derived from the bound port when absent.
    pub advertise_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8001".to_string(),
            advertise_url: None,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
