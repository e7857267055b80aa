//! City-wide zone aggregation.
//!
//! Queries every domain for one zone at the same time and merges the
//! answers. A domain that fails or misses the deadline shows up in
//! `errors`; the rest of the report is unaffected.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::Domain;
use crate::gateway::dispatcher::Dispatcher;
use crate::gateway::error::GatewayError;

/// Merged view of one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone_id: String,
    pub data: BTreeMap<Domain, Value>,
    pub errors: Vec<ServiceFailure>,
}

/// A domain that contributed nothing to a [`ZoneReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub service: Domain,
    pub reason: String,
    pub detail: String,
}

impl ServiceFailure {
    fn from_error(service: Domain, error: &GatewayError) -> Self {
        Self {
            service,
            reason: error.reason().to_string(),
            detail: error.to_string(),
        }
    }
}

/// Fan out `GET /{domain}/zone/{zone_id}` to every domain in `domains`.
///
/// Each call gets `per_call_timeout`, enforced by the dispatcher so that a
/// timed-out call still counts against the domain's breaker. The report is
/// ready once every call has answered or timed out, so total latency is
/// bounded by the slowest call rather than the sum.
///
/// `zone_id` must already have passed [`check_segments`](super::dispatcher::check_segments).
pub async fn aggregate_zone(
    dispatcher: &Dispatcher,
    domains: &[Domain],
    zone_id: &str,
    per_call_timeout: Duration,
    request_id: Option<&str>,
) -> ZoneReport {
    let calls = domains.iter().map(|&domain| async move {
        let segments = [domain.as_str(), "zone", zone_id];
        let outcome = dispatcher
            .dispatch(domain, &segments, request_id, Some(per_call_timeout))
            .await;
        (domain, outcome)
    });

    let mut report = ZoneReport {
        zone_id: zone_id.to_string(),
        data: BTreeMap::new(),
        errors: Vec::new(),
    };

    for (domain, outcome) in join_all(calls).await {
        match outcome {
            Ok(body) => {
                report.data.insert(domain, body);
            }
            Err(e) => report.errors.push(ServiceFailure::from_error(domain, &e)),
        }
    }

    tracing::info!(
        zone = %zone_id,
        answered = report.data.len(),
        failed = report.errors.len(),
        "Zone aggregated"
    );
    report
}
