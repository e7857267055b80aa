//! Smart-city service mesh: registry, gateway and simulated domain services.

pub mod config;
pub mod domain;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::MeshConfig;
pub use domain::{Domain, DomainService};
pub use gateway::GatewayServer;
pub use lifecycle::Shutdown;
pub use registry::RegistryServer;
