use clap::{Parser, Subcommand};
use serde_json::Value;

use city_mesh::http::X_REQUEST_ID;
use city_mesh::registry::RegistryClient;

#[derive(Parser)]
#[command(name = "mesh-cli")]
#[command(about = "Command line client for the city mesh registry and gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    registry: String,

    #[arg(short, long, default_value = "http://localhost:8080")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered service
    Services,
    /// Show the address registered under a name
    Discover { name: String },
    /// Register (or overwrite) a service address
    Register { name: String, url: String },
    /// Gateway status and circuit breaker states
    Status,
    /// GET a path through the gateway, e.g. `traffic/status`
    Get { path: String },
    /// Aggregated readings for one zone
    Zone { zone_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let registry = RegistryClient::new(client.clone(), cli.registry.clone());
    let gateway = cli.gateway.trim_end_matches('/');

    match cli.command {
        Commands::Services => {
            let services = registry.list().await?;
            if services.is_empty() {
                println!("No services registered");
            }
            for (name, url) in services {
                println!("{:<20} {}", name, url);
            }
        }
        Commands::Discover { name } => {
            println!("{}", registry.discover(&name).await?);
        }
        Commands::Register { name, url } => {
            let ack = registry.register(&name, &url).await?;
            println!("{} {}", ack.service, ack.status);
        }
        Commands::Status => {
            let res = client.get(format!("{}/", gateway)).send().await?;
            print_response(res).await?;
        }
        Commands::Get { path } => {
            let request_id = uuid::Uuid::new_v4().to_string();
            eprintln!("request id: {}", request_id);
            let res = client
                .get(format!("{}/{}", gateway, path.trim_start_matches('/')))
                .header(X_REQUEST_ID, request_id)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Zone { zone_id } => {
            let res = client
                .get(format!("{}/city/zone/{}", gateway, zone_id))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&body) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => body,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
