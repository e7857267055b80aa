//! City mesh process entry point.
//!
//! One binary, three roles:
//!
//! ```text
//!                    ┌──────────────┐
//!   client ────────▶ │   gateway    │ ── GET /discover/{name} ──▶ ┌──────────┐
//!                    │  (breakers,  │                              │ registry │
//!                    │   fan-out)   │                              └──────────┘
//!                    └──────┬───────┘                                   ▲
//!                           │ GET /{domain}/...                        │ POST /register
//!                           ▼                                           │
//!                    ┌──────────────┐                                   │
//!                    │ domain       │ ──────────────────────────────────┘
//!                    │ service (×6) │
//!                    └──────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;

use city_mesh::config::{load_or_default, MeshConfig};
use city_mesh::domain::{Domain, DomainService};
use city_mesh::gateway::GatewayServer;
use city_mesh::lifecycle::{wait_for_signal, Shutdown};
use city_mesh::observability::{logging, metrics};
use city_mesh::registry::RegistryServer;

#[derive(Parser)]
#[command(name = "city-mesh")]
#[command(about = "Service registry, API gateway and simulated city services", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Run the service registry
    Registry,
    /// Run the API gateway
    Gateway,
    /// Run a simulated domain service
    Service {
        /// traffic, energy, water, waste, security or health
        #[arg(short, long)]
        domain: Domain,

        /// Overrides `service.bind_address`
        #[arg(short, long)]
        bind: Option<String>,

        /// Overrides `service.advertise_url`
        #[arg(long)]
        advertise_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "city-mesh starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        on_signal.trigger();
    });

    match cli.role {
        Role::Registry => {
            let listener = bind(&config.registry.bind_address).await?;
            RegistryServer::new(&config)
                .run(listener, shutdown.subscribe())
                .await?;
        }
        Role::Gateway => {
            log_gateway_config(&config);
            let listener = bind(&config.gateway.bind_address).await?;
            GatewayServer::new(&config)?
                .run(listener, shutdown.subscribe())
                .await?;
        }
        Role::Service {
            domain,
            bind: bind_override,
            advertise_url,
        } => {
            if let Some(address) = bind_override {
                config.service.bind_address = address;
            }
            if advertise_url.is_some() {
                config.service.advertise_url = advertise_url;
            }
            tracing::info!(
                service = %domain.registry_name(),
                registry = %config.registration.registry_url,
                "Starting domain service"
            );
            let listener = bind(&config.service.bind_address).await?;
            DomainService::new(domain, &config)?
                .run(listener, shutdown.subscribe())
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn bind(address: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}

fn log_gateway_config(config: &MeshConfig) {
    tracing::info!(
        registry = %config.gateway.registry_url,
        fanout_timeout_ms = config.gateway.fanout_timeout_ms,
        breakers = config.gateway.breakers.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
}
