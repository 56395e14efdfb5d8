//! prices - house price prediction pipelines from the command line

use clap::Parser;
use prices_predictor::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prices_predictor=info".into()),
        )
        .init();

    run(Cli::parse()).await
}
