//! In-memory service registry.
//!
//! One address per service name; a later registration of the same name
//! replaces the earlier one. Nothing expires and nothing is persisted.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the registry store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No entry exists under the requested name.
    #[error("service '{0}' not found")]
    NotFound(String),

    /// Name or address was empty.
    #[error("invalid registration: {0}")]
    InvalidRegistration(&'static str),
}

/// Concurrent name → address map.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    services: Arc<DashMap<String, String>>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the address for `name`.
    ///
    /// Returns the address previously registered under that name, if any.
    pub fn register(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Option<String>, RegistryError> {
        let name = name.into();
        let address = address.into();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration("name must not be empty"));
        }
        if address.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration("url must not be empty"));
        }

        Ok(self.services.insert(name, address))
    }

    /// Look up the address registered under `name`.
    pub fn discover(&self, name: &str) -> Result<String, RegistryError> {
        self.services
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Snapshot of every registration, ordered by name.
    pub fn list_all(&self) -> BTreeMap<String, String> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
