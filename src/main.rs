use anyhow::{Context, Result};
use job_ingest::{start_web_server, AppContext, Settings};
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "job_ingest=info,rocket=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&settings.log_path)
        .with_context(|| format!("Failed to open log file: {}", settings.log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Invalid log directive")?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    info!("Starting job ingestion service");
    info!(
        "Environment: {}",
        job_ingest::environment::EnvironmentConfig::get_environment()
    );
    info!("Log file: {}", settings.log_path.display());
    info!("Server: http://0.0.0.0:{}", settings.port);

    let ctx = AppContext::from_settings(settings).await?;
    start_web_server(ctx).await
}
