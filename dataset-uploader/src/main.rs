use anyhow::Result;
use clap::Parser;
use dataset_uploader::cli::{run, Cli};
use dataset_uploader::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Values from a local .env become the flag defaults below.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_file)?;
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
