//! Issue Tracker REST API Server
//!
//! Serves the issue API from a SQLite database (or an in-memory store with
//! `--in-memory`).

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use issues::config::{TrackerConfig, DEFAULT_CONFIG_FILE};
use issues::errors::{bind_failed, config_invalid};
use issues::{InMemoryStorage, IssueRepository, IssueService};

#[derive(Debug, Parser)]
#[command(name = "issues-server", version, about = "Issue tracker REST API server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ISSUES_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long, env = "ISSUES_DATABASE")]
    database: Option<PathBuf>,

    /// Configuration file
    #[arg(long, env = "ISSUES_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Keep issues in memory only; nothing is persisted
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting issue tracker API server...");

    let config = TrackerConfig::load(&args.config)
        .map_err(|e| config_invalid(&args.config, &format!("{:#}", e)))?;

    let bind = args.bind.clone().unwrap_or_else(|| config.bind());
    let latest_limit = config.latest_limit();

    if args.in_memory {
        info!("Using in-memory storage; issues will be lost on exit");
        let storage = InMemoryStorage::new();
        storage.init()?;
        serve(storage, latest_limit, &bind).await
    } else {
        let path = args.database.clone().unwrap_or_else(|| config.database_path());
        let storage = issues_server::open_database(&path)?;
        info!("Using issue database at: {}", path.display());
        serve(storage, latest_limit, &bind).await
    }
}

async fn serve<S: IssueRepository + 'static>(
    storage: S,
    latest_limit: usize,
    bind: &str,
) -> Result<()> {
    let service = Arc::new(IssueService::new(storage).with_latest_limit(latest_limit));
    let app = issues_server::build_app(service);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| bind_failed(bind, &e.to_string()))?;
    info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
