//! City domains and the simulated domain service.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     server.rs binds → registry::registration announces <domain>_service
//!
//! Request:
//!     GET /<domain>/status          → sensors.rs (one reading)
//!     GET /<domain>/zone/{zone_id}  → sensors.rs (stable sensor layout per zone)
//! ```

pub mod sensors;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use server::DomainService;

/// One of the city subsystems reachable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Traffic,
    Energy,
    Water,
    Waste,
    Security,
    Health,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Traffic,
        Domain::Energy,
        Domain::Water,
        Domain::Waste,
        Domain::Security,
        Domain::Health,
    ];

    /// Route segment, e.g. `traffic` in `/traffic/status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Traffic => "traffic",
            Domain::Energy => "energy",
            Domain::Water => "water",
            Domain::Waste => "waste",
            Domain::Security => "security",
            Domain::Health => "health",
        }
    }

    /// Name the service registers under, e.g. `traffic_service`.
    pub fn registry_name(self) -> String {
        format!("{}_service", self.as_str())
    }

    /// Human readable name used in service banners.
    pub fn label(self) -> &'static str {
        match self {
            Domain::Traffic => "Traffic",
            Domain::Energy => "Energy",
            Domain::Water => "Water",
            Domain::Waste => "Waste",
            Domain::Security => "Security",
            Domain::Health => "Health",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a route segment names no known domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain '{0}'")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_route_segment() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
        assert_eq!("parking".parse::<Domain>(), Err(UnknownDomain("parking".into())));
        // Route segments are case-sensitive.
        assert!("Traffic".parse::<Domain>().is_err());
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(Domain::Traffic.registry_name(), "traffic_service");
        assert_eq!(Domain::Health.registry_name(), "health_service");
    }
}
