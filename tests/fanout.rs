//! Zone aggregation across every domain.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use city_mesh::domain::Domain;
use city_mesh::gateway::ZoneReport;
use city_mesh::lifecycle::Shutdown;

mod common;

/// Backend serving every domain; `slow` answers after two seconds.
async fn city_backend(slow: Option<Domain>) -> std::net::SocketAddr {
    common::start_backend(move |request| async move {
        let domain = request.path.split('/').nth(1).unwrap_or_default().to_string();
        if slow.map(|d| d.as_str() == domain).unwrap_or(false) {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        (200, format!(r#"[{{"id": "{}-sensor", "path": "{}"}}]"#, domain, request.path))
    })
    .await
}

#[tokio::test]
async fn test_slow_domain_times_out_without_blocking_others() {
    let shutdown = Shutdown::new();
    let backend = city_backend(Some(Domain::Water)).await;

    let (registry_url, store) = common::start_registry(&shutdown).await;
    for domain in Domain::ALL {
        store
            .register(domain.registry_name(), format!("http://{}", backend))
            .unwrap();
    }

    let mut config = common::gateway_config(&registry_url);
    config.gateway.fanout_timeout_ms = 300;
    let gateway = common::start_gateway(&config, &shutdown).await;

    let started = Instant::now();
    let res = common::client()
        .get(format!("{}/city/zone/Z1", gateway))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(res.status(), 200);
    let report: ZoneReport = res.json().await.unwrap();

    assert_eq!(report.zone_id, "Z1");
    assert_eq!(report.data.len(), 5);
    assert!(!report.data.contains_key(&Domain::Water));
    assert_eq!(report.data[&Domain::Traffic][0]["path"], "/traffic/zone/Z1");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].service, Domain::Water);
    assert_eq!(report.errors[0].reason, "timeout");

    assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_registrations_reported_per_domain() {
    let shutdown = Shutdown::new();
    let backend = city_backend(None).await;

    let (registry_url, store) = common::start_registry(&shutdown).await;
    for domain in [Domain::Traffic, Domain::Energy] {
        store
            .register(domain.registry_name(), format!("http://{}", backend))
            .unwrap();
    }
    let gateway = common::start_gateway(&common::gateway_config(&registry_url), &shutdown).await;

    let (status, body) = common::get_json(&format!("{}/city/zone/Z7", gateway)).await;
    assert_eq!(status, 200);
    let report: ZoneReport = serde_json::from_value(body).unwrap();

    assert_eq!(
        report.data.keys().copied().collect::<Vec<_>>(),
        vec![Domain::Traffic, Domain::Energy]
    );
    assert_eq!(report.errors.len(), 4);
    assert!(report
        .errors
        .iter()
        .all(|failure| failure.reason == "service not found"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_hung_domain_opens_breaker_across_zone_queries() {
    let shutdown = Shutdown::new();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let hung = common::start_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (200, "[]".to_string())
        }
    })
    .await;

    let (registry_url, store) = common::start_registry(&shutdown).await;
    store
        .register(Domain::Traffic.registry_name(), format!("http://{}", hung))
        .unwrap();

    let mut config = common::gateway_config(&registry_url);
    config.gateway.fanout_timeout_ms = 200;
    let gateway = common::start_gateway(&config, &shutdown).await;

    let traffic_reason = |report: &ZoneReport| {
        report
            .errors
            .iter()
            .find(|failure| failure.service == Domain::Traffic)
            .map(|failure| failure.reason.clone())
    };

    for _ in 0..3 {
        let (status, body) = common::get_json(&format!("{}/city/zone/Z1", gateway)).await;
        assert_eq!(status, 200);
        let report: ZoneReport = serde_json::from_value(body).unwrap();
        assert_eq!(traffic_reason(&report).as_deref(), Some("timeout"));
    }

    let (_, body) = common::get_json(&format!("{}/city/zone/Z1", gateway)).await;
    let report: ZoneReport = serde_json::from_value(body).unwrap();
    assert_eq!(traffic_reason(&report).as_deref(), Some("circuit open"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let (_, status_body) = common::get_json(&format!("{}/", gateway)).await;
    assert_eq!(status_body["breakers"]["traffic"]["state"], "open");
    assert_eq!(status_body["breakers"]["traffic"]["consecutive_failures"], 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_encoded_zone_id_stays_in_zone_route() {
    let shutdown = Shutdown::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let backend = common::start_backend(move |request| {
        recorder.lock().unwrap().push(request.path);
        async { (200, "[]".to_string()) }
    })
    .await;

    let (registry_url, store) = common::start_registry(&shutdown).await;
    store
        .register(Domain::Traffic.registry_name(), format!("http://{}", backend))
        .unwrap();
    let gateway = common::start_gateway(&common::gateway_config(&registry_url), &shutdown).await;

    let (status, body) =
        common::get_json(&format!("{}/city/zone/..%2F..%2Fadmin%3Fx=1", gateway)).await;
    assert_eq!(status, 200);
    let report: ZoneReport = serde_json::from_value(body).unwrap();
    assert_eq!(report.zone_id, "../../admin?x=1");
    assert!(report.data.contains_key(&Domain::Traffic));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), ["/traffic/zone/..%2F..%2Fadmin%3Fx=1"]);

    shutdown.trigger();
}
