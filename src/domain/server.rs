//! Simulated domain service process.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::MeshConfig;
use crate::domain::sensors::{ZoneError, ZoneSensors};
use crate::domain::Domain;
use crate::http::{build_client, detail_response, serve, with_common_layers};
use crate::observability::metrics;
use crate::registry::{register_with_retry, RegistryClient};
use crate::resilience::RetryPolicy;

/// Zone name used by `/<domain>/status`.
const STATUS_ZONE: &str = "city";

#[derive(Clone)]
struct ServiceState {
    domain: Domain,
    sensors: ZoneSensors,
}

/// One domain service: serves readings and registers itself on startup.
pub struct DomainService {
    state: ServiceState,
    registry: RegistryClient,
    policy: RetryPolicy,
    advertise_url: Option<String>,
    request_timeout: Duration,
}

impl DomainService {
    pub fn new(domain: Domain, config: &MeshConfig) -> Result<Self, reqwest::Error> {
        let http = build_client(&config.timeouts)?;
        Ok(Self {
            state: ServiceState {
                domain,
                sensors: ZoneSensors::new(domain),
            },
            registry: RegistryClient::new(http, config.registration.registry_url.clone()),
            policy: RetryPolicy::from(&config.registration),
            advertise_url: config.service.advertise_url.clone(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        })
    }

    pub fn domain(&self) -> Domain {
        self.state.domain
    }

    pub fn router(&self) -> Router {
        let domain = self.state.domain;
        let router = Router::new()
            .route("/", get(service_banner))
            .route(&format!("/{}/status", domain), get(current_status))
            .route(&format!("/{}/zone/{{zone_id}}", domain), get(zone_readings))
            .with_state(self.state.clone());
        with_common_layers(router, self.request_timeout)
    }

    /// Serve until shutdown, registering in the background.
    ///
    /// A failed registration is logged; the service keeps serving.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let local = listener.local_addr()?;
        let address = self
            .advertise_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", local.port()));
        let name = self.state.domain.registry_name();
        let registry = self.registry.clone();
        let policy = self.policy;

        tokio::spawn(async move {
            if let Err(e) = register_with_retry(&registry, &name, &address, policy).await {
                tracing::error!(
                    service = %name,
                    error = %e,
                    "Registration failed, service is not discoverable"
                );
            }
        });

        let router = self.router();
        serve(listener, router, shutdown).await
    }
}

async fn service_banner(State(state): State<ServiceState>) -> Json<Value> {
    let start = Instant::now();
    let banner = json!({
        "service": format!("{} Service", state.domain.label()),
        "status": "active",
    });
    metrics::record_service_request(state.domain.as_str(), "banner", 200, start);
    Json(banner)
}

async fn current_status(State(state): State<ServiceState>) -> Json<Value> {
    let start = Instant::now();
    let profile = state.sensors.profile();
    let sensor_id = format!("{}-{}-01", profile.id_prefix, STATUS_ZONE.to_uppercase());
    let reading = profile.reading(&sensor_id, STATUS_ZONE);
    metrics::record_service_request(state.domain.as_str(), "status", 200, start);
    Json(reading)
}

async fn zone_readings(
    State(state): State<ServiceState>,
    Path(zone_id): Path<String>,
) -> Response {
    let start = Instant::now();
    let response = match state.sensors.readings(&zone_id) {
        Ok(readings) => Json(readings).into_response(),
        Err(e @ ZoneError::InvalidZone(_)) => {
            detail_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ ZoneError::CapacityReached(_)) => {
            detail_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    };
    metrics::record_service_request(
        state.domain.as_str(),
        "zone",
        response.status().as_u16(),
        start,
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_banner() {
        let service = DomainService::new(Domain::Waste, &MeshConfig::default()).unwrap();
        let (status, body) = get(service.router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"service": "Waste Service", "status": "active"}));
    }

    #[tokio::test]
    async fn test_status_reading() {
        let service = DomainService::new(Domain::Energy, &MeshConfig::default()).unwrap();
        let (status, body) = get(service.router(), "/energy/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "PWR-CITY-01");
        let kw = body["consumption_kw"].as_u64().unwrap();
        assert!((100..=1000).contains(&kw));
    }

    #[tokio::test]
    async fn test_zone_is_stable_across_requests() {
        let service = DomainService::new(Domain::Water, &MeshConfig::default()).unwrap();
        let router = service.router();

        let (_, first) = get(router.clone(), "/water/zone/Z1").await;
        let (_, second) = get(router, "/water/zone/Z1").await;
        assert_eq!(first.as_array().unwrap().len(), second.as_array().unwrap().len());
        assert_eq!(first[0]["id"], "WTR-Z1-01");
    }

    #[tokio::test]
    async fn test_other_domain_routes_absent() {
        let service = DomainService::new(Domain::Water, &MeshConfig::default()).unwrap();
        let (status, _) = get(service.router(), "/traffic/status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_zone_id_rejected() {
        let service = DomainService::new(Domain::Health, &MeshConfig::default()).unwrap();
        let (status, body) = get(service.router(), "/health/zone/a%2Fb").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("invalid zone id"));
    }
}
