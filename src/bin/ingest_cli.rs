use anyhow::Result;
use clap::Parser;
use job_ingest::ingest_cli::{handle_ingest_command, IngestCli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_ingest=info")),
        )
        .with_target(false)
        .without_time()
        .init();

    handle_ingest_command(IngestCli::parse()).await
}
