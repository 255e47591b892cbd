//! Scribe daemon - HTTP relay between the writing UI and the model provider

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scribe_server::assist::AssistEngine;
use scribe_server::config::Config;
use scribe_server::error::Result;
use scribe_server::server::RelayServer;
use scribe_server::storage::Store;
use scribe_server::upstream::OpenAiClient;

/// Scribe - Writing-assistance relay backend
#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Relay between the writing UI and a hosted LLM")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the relay server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scribe_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        return read_config(&path);
    }

    let default_paths = [
        dirs::home_dir().map(|h| h.join(".scribe").join("config.toml")),
        dirs::config_dir().map(|c| c.join("scribe").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            return read_config(path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &PathBuf) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        scribe_server::ScribeError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str(&content)
        .map_err(|e| scribe_server::ScribeError::Config(format!("Failed to parse config: {e}")))
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Scribe daemon");

    let config = load_config(config_path)?;
    tracing::debug!("Config loaded: {:?}", config);

    // The provider credential is read exactly once, here. A missing key
    // aborts startup; it is never a per-request error.
    let client = OpenAiClient::new(&config.upstream)?;

    tracing::info!(
        "Opening store at: {}",
        config.storage.db_path.display()
    );
    let store = Store::open(&config.storage.db_path)?;

    let engine = Arc::new(AssistEngine::new(Arc::new(client)));
    let store = Arc::new(TokioMutex::new(store));

    let server = RelayServer::new(config.server.clone(), engine, store);
    server.serve().await?;

    tracing::info!("Scribe daemon stopped");
    Ok(())
}
