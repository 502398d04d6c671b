use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Address, RawTransaction, TransactionGroup};
use crate::error::IngestError;
use crate::ports::{LedgerQueryClient, PageRequest};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Loads one page of every visibility group for an account.
pub struct TransactionGroupFetcher {
    client: Arc<dyn LedgerQueryClient>,
    page_size: u32,
}

impl TransactionGroupFetcher {
    pub fn new(client: Arc<dyn LedgerQueryClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }

    /// Returns unconfirmed, then partial, then confirmed newest-first.
    /// Any failed group fails the whole fetch.
    pub async fn fetch(&self, address: &Address) -> Result<Vec<RawTransaction>, IngestError> {
        let (unconfirmed, partial, confirmed) = tokio::try_join!(
            self.search(TransactionGroup::Unconfirmed, address),
            self.search(TransactionGroup::Partial, address),
            self.search(TransactionGroup::Confirmed, address),
        )?;

        info!(
            %address,
            unconfirmed = unconfirmed.len(),
            partial = partial.len(),
            confirmed = confirmed.len(),
            "fetched transaction groups"
        );

        Ok(merge(unconfirmed, partial, confirmed))
    }

    async fn search(
        &self,
        group: TransactionGroup,
        address: &Address,
    ) -> Result<Vec<RawTransaction>, IngestError> {
        self.client
            .search_transactions(group, address, PageRequest::first(self.page_size))
            .await
            .map_err(|e| IngestError::Network(format!("{} search failed: {}", group, e)))
    }
}

/// Confirmed results arrive oldest-first and are reversed. A hash seen in more
/// than one group keeps only its confirmed copy, or else its first occurrence.
fn merge(
    unconfirmed: Vec<RawTransaction>,
    partial: Vec<RawTransaction>,
    mut confirmed: Vec<RawTransaction>,
) -> Vec<RawTransaction> {
    confirmed.reverse();

    let settled: HashSet<String> = confirmed
        .iter()
        .filter_map(|tx| tx.hash().map(str::to_string))
        .collect();
    let mut seen = HashSet::new();

    unconfirmed
        .into_iter()
        .chain(partial)
        .filter(|tx| tx.hash().map_or(true, |hash| !settled.contains(hash)))
        .chain(confirmed)
        .filter(|tx| match tx.hash() {
            Some(hash) => {
                let first = seen.insert(hash.to_string());
                if !first {
                    debug!(hash, "dropping duplicate transaction");
                }
                first
            }
            None => true,
        })
        .collect()
}
