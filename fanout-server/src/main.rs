//! fanout-server - HTTP surface of the social fan-out service

mod app;
mod http;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use app::{build_router, AppState};
use libfanout::config::Config;
use libfanout::content::MemoryContentStore;
use libfanout::credentials::{CredentialStore, FileCredentialStore};
use libfanout::dispatch::{AdapterSet, DispatchCoordinator};
use libfanout::logging::{LogFormat, LoggingConfig};
use libfanout::platforms::linkedin::LinkedinOauth;
use libfanout::platforms::twitter::TwitterAdapter;
use libfanout::post_log::PostLog;
use libfanout::schedule::TriggerRegistry;

#[derive(Parser, Debug)]
#[command(name = "fanout-server")]
#[command(about = "Serve the social fan-out HTTP API", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to the XDG location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config
    #[arg(short, long)]
    bind: Option<String>,

    /// Log format (text, json, or pretty)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    LoggingConfig::new(cli.log_format, "info".to_string(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "no config file found, using defaults");
            Config::default_config()
        }),
    };
    let bind = cli.bind.clone().unwrap_or_else(|| config.server.bind.clone());

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::open(config.credentials_path())?);
    let content = Arc::new(MemoryContentStore::new());
    let client = reqwest::Client::new();

    let coordinator = Arc::new(DispatchCoordinator::new(
        content.clone(),
        credentials.clone(),
        AdapterSet::standard(&client),
        Arc::new(PostLog::default()),
    ));
    let registry = TriggerRegistry::new(coordinator.clone());
    let oauth = LinkedinOauth::new(
        client.clone(),
        credentials.clone(),
        config.linkedin_redirect_uri(),
    );
    let twitter = TwitterAdapter::new(client);

    let state = Arc::new(AppState {
        config,
        coordinator,
        registry,
        content,
        credentials,
        oauth,
        twitter,
    });

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(bind = %bind, "fanout-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
