use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use symbol_ingest::cli::{self, Cli, Commands};
use symbol_ingest::config::{Config, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = Config::from_env_with_node(args.node.clone())?;

    // Setup logging
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    let result = match args.command {
        Commands::Fetch { address, compact } => cli::handle_fetch(&config, &address, compact).await,
        Commands::Check => cli::handle_check(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {:#}", e);
    }
    result
}
