//! Typed client for the registry HTTP API.
//!
//! Used by the gateway for discovery and by domain services for
//! self-registration.

use reqwest::StatusCode;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::registry::types::{Discovery, RegisterAck, Registration};

/// Failures talking to the registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The registry has no entry under the requested name.
    #[error("service '{0}' is not registered")]
    ServiceNotRegistered(String),

    /// The registry could not be reached.
    #[error("registry unreachable: {0}")]
    RegistryUnreachable(#[source] reqwest::Error),

    /// The registry answered with a status the client does not expect.
    #[error("registry answered with status {0}")]
    UnexpectedStatus(StatusCode),

    /// The registry answered with a body the client cannot decode.
    #[error("invalid registry response: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

/// HTTP client bound to one registry base URL.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /register`.
    pub async fn register(&self, name: &str, url: &str) -> Result<RegisterAck, DiscoveryError> {
        let response = self
            .http
            .post(format!("{}/register", self.base_url))
            .json(&Registration {
                name: name.to_string(),
                url: url.to_string(),
            })
            .send()
            .await
            .map_err(DiscoveryError::RegistryUnreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::UnexpectedStatus(status));
        }
        response.json().await.map_err(DiscoveryError::InvalidResponse)
    }

    /// `GET /discover/{name}`: the current address of `name`.
    pub async fn discover(&self, name: &str) -> Result<String, DiscoveryError> {
        let response = self
            .http
            .get(format!("{}/discover/{}", self.base_url, name))
            .send()
            .await
            .map_err(DiscoveryError::RegistryUnreachable)?;

        match response.status() {
            StatusCode::OK => {
                let discovery: Discovery =
                    response.json().await.map_err(DiscoveryError::InvalidResponse)?;
                Ok(discovery.url)
            }
            StatusCode::NOT_FOUND => Err(DiscoveryError::ServiceNotRegistered(name.to_string())),
            status => Err(DiscoveryError::UnexpectedStatus(status)),
        }
    }

    /// `GET /`: every registration.
    pub async fn list(&self) -> Result<BTreeMap<String, String>, DiscoveryError> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(DiscoveryError::RegistryUnreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::UnexpectedStatus(status));
        }
        response.json().await.map_err(DiscoveryError::InvalidResponse)
    }
}
