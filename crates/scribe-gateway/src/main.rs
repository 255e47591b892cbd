//! Scribe gateway - browser-facing relay in front of the backend

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scribe_gateway::{AppState, GatewayConfig, create_router};

/// Scribe gateway - forwards browser requests to the Scribe backend
#[derive(Parser)]
#[command(name = "scribe-gateway")]
#[command(about = "Browser-facing gateway for the Scribe backend")]
#[command(version)]
pub struct Cli {
    /// Address to listen on (overrides SCRIBE_GATEWAY_ADDR)
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Backend base URL (overrides SCRIBE_BACKEND_URL)
    #[arg(long)]
    pub backend_url: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env();
    if let Some(listen_addr) = cli.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(backend_url) = cli.backend_url {
        config.backend_url = backend_url;
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    let addr: SocketAddr = config.listen_addr.parse()?;
    tracing::info!("Starting gateway on {addr}, backend: {}", config.backend_url);

    let state = Arc::new(AppState { config, client });
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway shut down gracefully");
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scribe_gateway=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
