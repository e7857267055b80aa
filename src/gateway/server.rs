//! Gateway HTTP surface.
//!
//! ```text
//! GET /                         → gateway status and breaker states
//! GET /city/zone/{zone_id}      → zone report across all domains
//! GET /{service}/{*path}        → proxied to the registered <service>_service
//! ```

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::MeshConfig;
use crate::domain::Domain;
use crate::gateway::dispatcher::{check_segments, Dispatcher};
use crate::gateway::error::GatewayError;
use crate::gateway::fanout::{aggregate_zone, ZoneReport};
use crate::http::{build_client, request_id, serve, with_common_layers};
use crate::registry::RegistryClient;

/// Shared state for gateway handlers.
#[derive(Clone)]
struct GatewayState {
    dispatcher: Arc<Dispatcher>,
    domains: Arc<[Domain]>,
    fanout_timeout: Duration,
}

/// The gateway process.
pub struct GatewayServer {
    state: GatewayState,
    request_timeout: Duration,
}

impl GatewayServer {
    pub fn new(config: &MeshConfig) -> Result<Self, reqwest::Error> {
        let http = build_client(&config.timeouts)?;
        let registry = RegistryClient::new(http.clone(), config.gateway.registry_url.clone());
        let dispatcher = Dispatcher::new(registry, http, &config.gateway.breakers);

        Ok(Self {
            state: GatewayState {
                dispatcher: Arc::new(dispatcher),
                domains: config.gateway.domains.clone().into(),
                fanout_timeout: config.gateway.fanout_timeout(),
            },
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        })
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.state.dispatcher.clone()
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(gateway_status))
            .route("/city/zone/{zone_id}", get(zone_report))
            .route("/{service}/{*path}", get(proxy_request))
            .with_state(self.state.clone());
        with_common_layers(router, self.request_timeout)
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            registry = %self.state.dispatcher.registry_url(),
            domains = self.state.domains.len(),
            "Gateway ready"
        );
        let router = self.router();
        serve(listener, router, shutdown).await
    }
}

async fn gateway_status(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "service": "API Gateway",
        "status": "active",
        "breakers": state.dispatcher.breaker_snapshots(),
    }))
}

async fn proxy_request(
    State(state): State<GatewayState>,
    Path((service, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, GatewayError> {
    let domain: Domain = service
        .parse()
        .map_err(|_| GatewayError::UnknownService(service.clone()))?;

    let segments: Vec<&str> = std::iter::once(domain.as_str())
        .chain(path.split('/'))
        .collect();
    let body = state
        .dispatcher
        .dispatch(domain, &segments, request_id(&headers), None)
        .await?;
    Ok(Json(body))
}

async fn zone_report(
    State(state): State<GatewayState>,
    Path(zone_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ZoneReport>, GatewayError> {
    check_segments("city", &[zone_id.as_str()])?;

    let report = aggregate_zone(
        &state.dispatcher,
        &state.domains,
        &zone_id,
        state.fanout_timeout,
        request_id(&headers),
    )
    .await;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn offline_config() -> MeshConfig {
        let mut config = MeshConfig::default();
        config.gateway.registry_url = "http://127.0.0.1:9".to_string();
        config
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_lists_breakers() {
        let server = GatewayServer::new(&offline_config()).unwrap();
        let (status, body) = get(server.router(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "API Gateway");
        assert_eq!(body["status"], "active");
        assert_eq!(body["breakers"]["traffic"]["state"], "closed");
        assert_eq!(body["breakers"]["traffic"]["consecutive_failures"], 0);
    }

    #[tokio::test]
    async fn test_unknown_service_is_404() {
        let server = GatewayServer::new(&offline_config()).unwrap();
        let (status, body) = get(server.router(), "/parking/status").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["reason"], "unknown service");
        assert_eq!(body["service"], "parking");
    }

    #[tokio::test]
    async fn test_registry_down_is_503() {
        let server = GatewayServer::new(&offline_config()).unwrap();
        let (status, body) = get(server.router(), "/traffic/status").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["reason"], "registry unavailable");
        assert_eq!(body["service"], "traffic");

        // Registry failures leave the breaker alone.
        let dispatcher = server.dispatcher();
        let snapshot = dispatcher.breaker(Domain::Traffic).unwrap().snapshot();
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_dot_segments_rejected_before_lookup() {
        let server = GatewayServer::new(&offline_config()).unwrap();

        let (status, body) = get(server.router(), "/traffic/%2E%2E/admin").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "invalid path");
        assert_eq!(body["service"], "traffic");

        let (status, body) = get(server.router(), "/city/zone/%2E%2E").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "invalid path");
        assert_eq!(body["service"], "city");
    }
}
