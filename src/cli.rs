use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::Config;
use crate::domain::Address;
use crate::services::IngestionPipeline;
use crate::symbol::SymbolClient;

#[derive(Parser)]
#[command(name = "symbol-ingest")]
#[command(about = "Symbol transaction ingestion - fetch and normalize account transactions", long_about = None)]
pub struct Cli {
    /// Node URL, overrides SYMBOL_NODE_URL
    #[arg(long, global = true)]
    pub node: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and normalize the transactions of an account
    Fetch {
        /// Account address, plain or pretty form
        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Check that the node is reachable and healthy
    Check,

    /// Configuration validation
    Config,
}

pub fn symbol_client(config: &Config) -> SymbolClient {
    SymbolClient::with_circuit_breaker(
        config.network.node_url.clone(),
        config.request_timeout(),
        config.circuit_breaker_threshold,
        config.circuit_breaker_reset_secs,
    )
}

pub async fn handle_fetch(config: &Config, raw_address: &str, compact: bool) -> anyhow::Result<()> {
    let address = Address::from_raw(raw_address)?;
    if address.network_type() != config.network.network_type {
        tracing::warn!(
            "Address {} belongs to network {}, node is configured for {}",
            address,
            address.network_type(),
            config.network.network_type
        );
    }

    let pipeline = IngestionPipeline::new(
        Arc::new(symbol_client(config)),
        config.network.clone(),
        config.pipeline_options(),
    );
    let transactions = pipeline.run(&address).await?;

    let output = if compact {
        serde_json::to_string(&transactions)?
    } else {
        serde_json::to_string_pretty(&transactions)?
    };
    println!("{}", output);

    Ok(())
}

pub async fn handle_check(config: &Config) -> anyhow::Result<()> {
    let client = symbol_client(config);
    let health = client.node_health().await?;

    if !health.is_up() {
        anyhow::bail!(
            "Node {} is unhealthy (api: {}, db: {})",
            config.network.node_url,
            health.status.api_node,
            health.status.db
        );
    }

    tracing::info!("Node {} is healthy", config.network.node_url);
    println!("✓ Node {} is healthy", config.network.node_url);
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Node URL: {}", config.network.node_url);
    println!("  Network: {}", config.network.network_type);
    println!("  Epoch adjustment: {}s", config.network.epoch_adjustment);
    println!("  Page size: {}", config.page_size);
    println!("  Max aggregate depth: {}", config.max_aggregate_depth);
    println!("  Request timeout: {}s", config.request_timeout_secs);
    println!("  Pipeline timeout: {}s", config.pipeline_timeout_secs);
    println!(
        "  Circuit breaker: {} failures, {}s reset",
        config.circuit_breaker_threshold, config.circuit_breaker_reset_secs
    );

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}
