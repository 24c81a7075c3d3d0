use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    config::{LogFormat, Settings},
    create_router, AppState, LocalServices,
};
use clap::{Parser, ValueEnum};
use tokio::{net::TcpListener, sync::watch};
use tracing_subscriber::EnvFilter;

/// Identity service and authenticated edge gateway
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML config file (defaults to ./authgate.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override the log output format
    #[arg(long, value_enum)]
    log_format: Option<CliLogFormat>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLogFormat {
    Text,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Text => LogFormat::Text,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn shutdown_signal(tx: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
    let _ = tx.send(true);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    if let Some(format) = cli.log_format {
        settings.log_format = format.into();
    }

    init_tracing(&settings)?;
    tracing::info!(?settings, "starting authgate");

    let services = LocalServices::new(&settings)?;
    let state = AppState::new(settings.clone(), services.backends())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let background = services.start_background(&settings, shutdown_rx)?;

    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    tracing::info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    for handle in background {
        handle.abort();
    }
    tracing::info!("stopped");

    Ok(())
}
