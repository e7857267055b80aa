//! Per-request dispatch to a domain service.
//!
//! # Responsibilities
//! - Resolve the domain's address through the registry on every request
//! - Call the resolved address, through the domain's breaker when one exists
//! - Validate the downstream status and payload
//! - Map every failure to a [`GatewayError`]
//!
//! # Design Decisions
//! - Addresses are never cached; a re-registration is visible on the next call
//! - Registry failures never touch the breaker; only downstream outcomes do
//! - Non-2xx and non-JSON answers both count as breaker failures
//! - A per-call deadline is enforced inside the breaker, so a hung downstream
//!   is recorded as a failure instead of being cancelled unseen

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::BreakerConfig;
use crate::domain::Domain;
use crate::gateway::error::GatewayError;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::registry::{DiscoveryError, RegistryClient};
use crate::resilience::{BreakerError, BreakerSnapshot, CircuitBreaker};

/// Resolves domains and forwards calls to them.
#[derive(Debug)]
pub struct Dispatcher {
    registry: RegistryClient,
    http: reqwest::Client,
    breakers: HashMap<Domain, Arc<CircuitBreaker>>,
}

impl Dispatcher {
    pub fn new(registry: RegistryClient, http: reqwest::Client, breakers: &[BreakerConfig]) -> Self {
        let breakers = breakers
            .iter()
            .map(|config| {
                tracing::info!(
                    downstream = %config.service,
                    failure_threshold = config.failure_threshold,
                    reset_timeout_secs = config.reset_timeout_secs,
                    "Circuit breaker configured"
                );
                let breaker = CircuitBreaker::new(
                    config.service.as_str(),
                    config.failure_threshold,
                    config.reset_timeout(),
                );
                (config.service, Arc::new(breaker))
            })
            .collect();

        Self {
            registry,
            http,
            breakers,
        }
    }

    pub fn registry_url(&self) -> &str {
        self.registry.base_url()
    }

    /// Breaker guarding `domain`, if one is configured.
    pub fn breaker(&self, domain: Domain) -> Option<&Arc<CircuitBreaker>> {
        self.breakers.get(&domain)
    }

    /// State of every configured breaker.
    pub fn breaker_snapshots(&self) -> BTreeMap<Domain, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|(domain, breaker)| (*domain, breaker.snapshot()))
            .collect()
    }

    /// Ask the registry where `domain` lives.
    pub async fn resolve(&self, domain: Domain) -> Result<String, GatewayError> {
        self.registry
            .discover(&domain.registry_name())
            .await
            .map_err(|e| match e {
                DiscoveryError::ServiceNotRegistered(_) => {
                    GatewayError::ServiceNotFound { service: domain }
                }
                other => GatewayError::RegistryUnavailable {
                    service: domain,
                    detail: other.to_string(),
                },
            })
    }

    /// Resolve `domain` and `GET` the path built from `segments`, returning
    /// the JSON body.
    ///
    /// Each segment is percent-encoded on its own, so a decoded `/` or `?`
    /// cannot leave the route it was captured from. With a `deadline`, the
    /// registry lookup and the downstream call share that budget; a
    /// downstream timeout counts as a breaker failure.
    pub async fn dispatch(
        &self,
        domain: Domain,
        segments: &[&str],
        request_id: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<Value, GatewayError> {
        let start = Instant::now();
        let path = segments.join("/");
        let result = match check_segments(domain.as_str(), segments) {
            Ok(()) => {
                let deadline = deadline.map(|limit| Deadline { limit, started: start });
                self.resolve_and_call(domain, segments, request_id, deadline)
                    .await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => metrics::record_request(domain.as_str(), "ok", start),
            Err(e) => {
                tracing::warn!(
                    service = %domain,
                    path = %path,
                    request_id = request_id.unwrap_or("unknown"),
                    reason = e.reason(),
                    error = %e,
                    "Dispatch failed"
                );
                metrics::record_request(domain.as_str(), e.outcome(), start);
            }
        }
        result
    }

    async fn resolve_and_call(
        &self,
        domain: Domain,
        segments: &[&str],
        request_id: Option<&str>,
        deadline: Option<Deadline>,
    ) -> Result<Value, GatewayError> {
        let address = match deadline {
            Some(deadline) => tokio::time::timeout(deadline.limit, self.resolve(domain))
                .await
                .map_err(|_| deadline.expired(domain))??,
            None => self.resolve(domain).await?,
        };
        let url = downstream_url(domain, &address, segments)?;

        if let Some(deadline) = deadline {
            if deadline.remaining().is_zero() {
                return Err(deadline.expired(domain));
            }
        }

        tracing::debug!(service = %domain, url = %url, "Forwarding request");

        match self.breakers.get(&domain) {
            Some(breaker) => breaker
                .call(|| self.fetch(domain, &url, request_id, deadline))
                .await
                .map_err(|e| match e {
                    BreakerError::Open => GatewayError::CircuitOpen { service: domain },
                    BreakerError::Inner(inner) => inner,
                }),
            None => self.fetch(domain, &url, request_id, deadline).await,
        }
    }

    /// One downstream request. Any non-2xx status is a failure.
    async fn fetch(
        &self,
        domain: Domain,
        url: &Url,
        request_id: Option<&str>,
        deadline: Option<Deadline>,
    ) -> Result<Value, GatewayError> {
        let mut request = self.http.get(url.clone());
        if let Some(id) = request_id {
            request = request.header(X_REQUEST_ID, id);
        }
        if let Some(deadline) = deadline {
            request = request.timeout(deadline.remaining());
        }

        let response = request.send().await.map_err(|e| match deadline {
            Some(deadline) if e.is_timeout() => deadline.expired(domain),
            _ => GatewayError::DownstreamUnreachable {
                service: domain,
                detail: e.to_string(),
            },
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::DownstreamError {
                service: domain,
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| match deadline {
            Some(deadline) if e.is_timeout() => deadline.expired(domain),
            _ => GatewayError::InvalidPayload {
                service: domain,
                detail: e.to_string(),
            },
        })
    }
}

/// Time budget of one dispatch.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Duration,
    started: Instant,
}

impl Deadline {
    fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    fn expired(&self, service: Domain) -> GatewayError {
        GatewayError::Timeout {
            service,
            timeout_ms: self.limit.as_millis() as u64,
        }
    }
}

/// Reject `.` and `..` segments; they would be dropped or resolved when the
/// URL is built and the request would land on a different route.
pub fn check_segments(service: &str, segments: &[&str]) -> Result<(), GatewayError> {
    if segments.iter().any(|s| matches!(*s, "." | "..")) {
        return Err(GatewayError::InvalidPath {
            service: service.to_string(),
            path: segments.join("/"),
        });
    }
    Ok(())
}

/// `address` with `segments` appended, each percent-encoded.
fn downstream_url(domain: Domain, address: &str, segments: &[&str]) -> Result<Url, GatewayError> {
    let invalid = |detail: String| GatewayError::DownstreamUnreachable {
        service: domain,
        detail,
    };

    let mut url = Url::parse(address)
        .map_err(|e| invalid(format!("invalid registered address '{}': {}", address, e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("registered address '{}' cannot carry a path", address)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
