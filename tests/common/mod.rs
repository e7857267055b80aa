//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use city_mesh::config::MeshConfig;
use city_mesh::gateway::GatewayServer;
use city_mesh::lifecycle::Shutdown;
use city_mesh::registry::{RegistryServer, RegistryStore};

/// What a mock backend saw of one request.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub path: String,
    pub request_id: Option<String>,
}

/// Start a programmable mock backend on an ephemeral port.
///
/// The handler returns the status code and the raw body to send back.
pub async fn start_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body) = handler(request).await;
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason_phrase(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Backend answering every request with the same status and body.
pub async fn start_fixed_backend(status: u16, body: &'static str) -> SocketAddr {
    start_backend(move |_| async move { (status, body.to_string()) }).await
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 || buf.len() > 16 * 1024 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let request_id = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("x-request-id")
            .then(|| value.trim().to_string())
    });
    Some(MockRequest { path, request_id })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Start a registry on an ephemeral port; returns its base URL and store.
pub async fn start_registry(shutdown: &Shutdown) -> (String, RegistryStore) {
    let server = RegistryServer::new(&MeshConfig::default());
    let store = server.store();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (url, store)
}

/// Start a gateway on an ephemeral port; returns its base URL.
pub async fn start_gateway(config: &MeshConfig, shutdown: &Shutdown) -> String {
    let server = GatewayServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    url
}

/// Gateway config pointing at `registry_url`.
pub fn gateway_config(registry_url: &str) -> MeshConfig {
    let mut config = MeshConfig::default();
    config.gateway.registry_url = registry_url.to_string();
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub async fn get_json(url: &str) -> (u16, serde_json::Value) {
    let res = client().get(url).send().await.expect("gateway unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}
