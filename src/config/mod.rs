//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MeshConfig (validated, immutable)
//!     → each role picks the sections it needs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::BreakerConfig;
pub use schema::GatewayConfig;
pub use schema::MeshConfig;
pub use schema::ObservabilityConfig;
pub use schema::RegistrationConfig;
pub use schema::TimeoutConfig;
