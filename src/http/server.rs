//! HTTP server setup shared by the registry, the gateway and the domain services.
//!
//! # Responsibilities
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind a router to a listener
//! - Stop accepting and drain on shutdown

use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// Apply the middleware stack every role uses.
///
/// The request ID is assigned outermost so the trace span and the handler
/// both see it.
#[allow(deprecated)]
pub fn with_common_layers(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

/// Serve `router` on `listener` until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!(address = %addr, "HTTP server stopped");
    Ok(())
}
