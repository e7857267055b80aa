//! Wire types of the registry HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub url: String,
}

/// Answer to a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAck {
    pub status: String,
    pub service: String,
}

impl RegisterAck {
    pub fn registered(service: impl Into<String>) -> Self {
        Self {
            status: "registered".to_string(),
            service: service.into(),
        }
    }
}

/// Answer to `GET /discover/{service_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub url: String,
}
