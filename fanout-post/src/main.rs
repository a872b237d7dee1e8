//! fanout-post - dispatch one post to one social platform, immediately

use clap::Parser;
use std::sync::Arc;

use libfanout::config::Config;
use libfanout::content::{ContentStore, MemoryContentStore};
use libfanout::credentials::{CredentialStore, FileCredentialStore};
use libfanout::dispatch::{AdapterSet, DispatchCoordinator};
use libfanout::post_log::PostLog;
use libfanout::types::{Platform, PostContent};
use libfanout::{FanoutError, Result};

#[derive(Parser, Debug)]
#[command(name = "fanout-post")]
#[command(about = "Dispatch one post to a social platform now", long_about = None)]
struct Cli {
    /// Target platform (facebook, twitter, linkedin, instagram)
    #[arg(short, long)]
    platform: String,

    /// Post id used in logging and diagnostics
    #[arg(long, default_value = "cli")]
    id: String,

    /// Post title (first line of the message)
    #[arg(short, long)]
    title: String,

    /// Post body (reads from stdin if not provided)
    body: Option<String>,

    /// Public URL attached to the post
    #[arg(short, long)]
    url: String,

    /// Path to the config file (defaults to the XDG location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("error")
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli).await {
        Ok(result) if result.success => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<libfanout::DispatchResult> {
    let platform: Platform = cli.platform.parse()?;

    let body = match cli.body {
        Some(body) => body,
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| FanoutError::InvalidInput(format!("failed to read stdin: {e}")))?;
            buffer
        }
    };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|_| Config::default_config()),
    };

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::open(config.credentials_path())?);
    let content = Arc::new(MemoryContentStore::new());
    content.upsert(PostContent {
        id: cli.id.clone(),
        title: cli.title,
        body,
        url: cli.url,
    });

    let coordinator = DispatchCoordinator::new(
        content,
        credentials,
        AdapterSet::standard(&reqwest::Client::new()),
        Arc::new(PostLog::default()),
    );

    let result = coordinator.dispatch(&cli.id, platform).await;

    match cli.format.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&result)
                .map_err(|e| FanoutError::InvalidInput(e.to_string()))?
        ),
        _ => {
            if result.success {
                match &result.remote_id {
                    Some(id) => println!("posted to {}: {}", result.platform, id),
                    None => println!("posted to {}", result.platform),
                }
            } else {
                println!("failed: {}", result.message);
            }
        }
    }

    Ok(result)
}
