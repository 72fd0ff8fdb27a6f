use std::path::PathBuf;

use clap::Parser;

use jamesos_core::NewLog;
use jamesos_server::ServerConfig;
use jamesos_store::{Backend, LogRepo};

/// James OS dashboard backend.
#[derive(Debug, Parser)]
#[command(name = "jamesos")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Persist logs to this JSON file instead of process memory.
    #[arg(long, env = "JAMESOS_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Retention bound; defaults to 1000 in memory, 500 file-backed.
    #[arg(long)]
    capacity: Option<usize>,

    /// Environment label reported by /api/health.
    #[arg(long, env = "JAMESOS_ENV", default_value = "development")]
    environment: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("starting James OS dashboard backend");

    let backend = match &cli.data_file {
        Some(path) => Backend::open(path)?,
        None => Backend::in_memory(),
    };
    let backend = match cli.capacity {
        Some(capacity) => backend.with_capacity(capacity),
        None => backend,
    };

    if backend.was_created() {
        let repo = LogRepo::new(backend.clone());
        repo.insert(NewLog {
            message: Some("activity logger initialized".into()),
            details: Some("logging system ready".into()),
            ..Default::default()
        })?;
    }

    let config = ServerConfig {
        port: cli.port,
        environment: cli.environment,
    };
    let handle = jamesos_server::start(config, backend).await?;
    tracing::info!(port = handle.port, "James OS server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    Ok(())
}
