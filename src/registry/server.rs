//! Registry HTTP surface.
//!
//! ```text
//! POST /register                  {name, url} → {status: "registered", service}
//! GET  /discover/{service_name}   → {url} | 404
//! GET  /                          → {name: url, ...}
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::MeshConfig;
use crate::http::{detail_response, serve, with_common_layers};
use crate::observability::metrics;
use crate::registry::store::{RegistryError, RegistryStore};
use crate::registry::types::{Discovery, RegisterAck, Registration};

/// The registry process.
pub struct RegistryServer {
    store: RegistryStore,
    request_timeout: Duration,
}

impl RegistryServer {
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            store: RegistryStore::new(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }

    /// Handle to the store, shared with the running server.
    pub fn store(&self) -> RegistryStore {
        self.store.clone()
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(list_services))
            .route("/register", post(register_service))
            .route("/discover/{service_name}", get(discover_service))
            .with_state(self.store.clone());
        with_common_layers(router, self.request_timeout)
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let router = self.router();
        serve(listener, router, shutdown).await
    }
}

async fn register_service(
    State(store): State<RegistryStore>,
    Json(registration): Json<Registration>,
) -> Response {
    match store.register(registration.name.clone(), registration.url.clone()) {
        Ok(previous) => {
            tracing::info!(
                service = %registration.name,
                url = %registration.url,
                replaced = ?previous,
                "Registered service"
            );
            metrics::record_registration(&registration.name);
            Json(RegisterAck::registered(registration.name)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected registration");
            detail_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

async fn discover_service(
    State(store): State<RegistryStore>,
    Path(service_name): Path<String>,
) -> Response {
    match store.discover(&service_name) {
        Ok(url) => Json(Discovery { url }).into_response(),
        Err(RegistryError::NotFound(_)) => {
            tracing::debug!(service = %service_name, "Discovery miss");
            detail_response(StatusCode::NOT_FOUND, "Service not found")
        }
        Err(e) => detail_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn list_services(State(store): State<RegistryStore>) -> Json<BTreeMap<String, String>> {
    Json(store.list_all())
}
