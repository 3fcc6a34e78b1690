//! WiFiNet: billing and subscriber management for small ISPs and
//! WiFi resellers.
//!
//! Main entry point that opens the data document and starts the server.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use wifinet_api::ApiServer;
use wifinet_billing::SimulatedGateway;
use wifinet_core::config::{AppConfig, StoreBackend};
use wifinet_management::ManagementState;
use wifinet_store::{build_store, Repository};

#[derive(Parser, Debug)]
#[command(name = "wifinet")]
#[command(about = "Billing, collection and router provisioning for WiFi subscribers")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "WIFINET__NODE_ID")]
    node_id: Option<String>,

    /// Bind address (overrides config)
    #[arg(long, env = "WIFINET__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "WIFINET__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Document backend: file, memory or remote
    #[arg(long)]
    store: Option<StoreBackend>,

    /// Path of the JSON data document for the file backend
    #[arg(long)]
    data_path: Option<String>,

    /// Base URL of the remote document service
    #[arg(long)]
    remote_url: Option<String>,

    /// Do not start the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wifinet=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("WiFiNet starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(backend) = cli.store {
        config.store.backend = backend;
    }
    if let Some(path) = cli.data_path {
        config.store.path = path;
    }
    if let Some(url) = cli.remote_url {
        config.store.remote_url = Some(url);
    }
    if cli.no_metrics {
        config.metrics.enabled = false;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        store = ?config.store.backend,
        "Configuration loaded"
    );

    let backend = build_store(&config.store)?;
    let repo = Arc::new(Repository::open(backend).await?);
    let gateway = Arc::new(SimulatedGateway::from_config(&config.provisioning));
    let state = ManagementState::new(repo.clone(), &config, gateway);

    let api_server = ApiServer::new(config.clone(), state);

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    // Pick up writes made by other processes sharing the document.
    if config.store.refresh_interval_secs > 0 {
        let repo = repo.clone();
        let every = Duration::from_secs(config.store.refresh_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = repo.refresh().await {
                    warn!(error = %e, "Background refresh failed");
                }
            }
        });
    }

    info!("WiFiNet is ready to serve traffic");

    api_server.start_http().await?;

    Ok(())
}
