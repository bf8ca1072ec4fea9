//! Omniroute binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use omniroute::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "omniroute=debug" } else { "omniroute=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    cli::execute(cli).await
}
