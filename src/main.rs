//! askql - ask questions in plain language, get read-only SQL results back.

use anyhow::Context;
use askql::cli::Cli;
use askql::config::Config;
use askql::{logging, server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config = match cli.config_path() {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            Config::load_from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    let config = config.apply_overrides(cli.to_overrides());

    server::serve(&config).await.context("server failed")?;
    Ok(())
}
