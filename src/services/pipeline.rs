use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

use super::asset_resolver::AssetResolver;
use super::group_fetcher::{TransactionGroupFetcher, DEFAULT_PAGE_SIZE};
use super::normalizer::{TransactionNormalizer, DEFAULT_MAX_AGGREGATE_DEPTH};
use crate::config::NetworkDescriptor;
use crate::domain::{Address, TransactionModel};
use crate::error::IngestError;
use crate::ports::LedgerQueryClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub page_size: u32,
    pub max_aggregate_depth: usize,
    /// Bounds the whole run; in-flight requests are dropped when it elapses.
    pub timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_aggregate_depth: DEFAULT_MAX_AGGREGATE_DEPTH,
            timeout: None,
        }
    }
}

/// Fetches an account's transactions and normalizes them for display.
pub struct IngestionPipeline {
    client: Arc<dyn LedgerQueryClient>,
    network: NetworkDescriptor,
    options: PipelineOptions,
}

impl IngestionPipeline {
    pub fn new(
        client: Arc<dyn LedgerQueryClient>,
        network: NetworkDescriptor,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            network,
            options,
        }
    }

    /// Only a failed group fetch or the timeout fail the run; per-transaction
    /// problems degrade that transaction and are reported in its diagnostics.
    pub async fn run(&self, address: &Address) -> Result<Vec<TransactionModel>, IngestError> {
        let span = info_span!("ingest", %address, node = %self.network.node_url);
        let run = self.run_inner(address).instrument(span);

        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| IngestError::Timeout(limit))?,
            None => run.await,
        }
    }

    async fn run_inner(&self, address: &Address) -> Result<Vec<TransactionModel>, IngestError> {
        let fetcher = TransactionGroupFetcher::new(self.client.clone(), self.options.page_size);
        let transactions = fetcher.fetch(address).await?;

        let resolver = Arc::new(AssetResolver::new(self.client.clone()));
        let normalizer = TransactionNormalizer::new(
            self.client.clone(),
            resolver.clone(),
            self.network.clone(),
            self.options.max_aggregate_depth,
        );

        let models: Vec<TransactionModel> = join_all(transactions.iter().map(|raw| {
            let normalizer = &normalizer;
            async move {
                match normalizer.normalize(raw).await {
                    Ok(model) => model,
                    Err(e) => {
                        warn!(hash = ?raw.hash(), error = %e, "transaction degraded");
                        normalizer.unresolved(raw, &e)
                    }
                }
            }
        }))
        .await;

        let mosaics = resolver.cached().await;
        info!(
            transactions = models.len(),
            degraded = models.iter().filter(|model| model.is_degraded()).count(),
            mosaics,
            "ingestion finished"
        );

        Ok(models)
    }
}
