//! Port over the ledger node's query endpoints.
//! The pipeline depends only on this trait, so tests can swap in fakes.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{Address, RawTransaction, TransactionGroup};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NodeError::InvalidResponse(err.to_string())
        } else {
            NodeError::Transport(err.to_string())
        }
    }
}

pub type NodeResult<T> = Result<T, NodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn first(size: u32) -> Self {
        Self { number: 1, size }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicInfo {
    pub mosaic_id: String,
    pub divisibility: u8,
}

#[async_trait]
pub trait LedgerQueryClient: Send + Sync {
    async fn search_transactions(
        &self,
        group: TransactionGroup,
        address: &Address,
        page: PageRequest,
    ) -> NodeResult<Vec<RawTransaction>>;

    /// Returns the transaction with aggregate inner transactions populated.
    async fn get_full_transaction(
        &self,
        id: &str,
        group: TransactionGroup,
    ) -> NodeResult<RawTransaction>;

    async fn get_mosaic_info(&self, mosaic_id: &str) -> NodeResult<MosaicInfo>;

    /// Maps each mosaic id to its display name. Ids without a name are omitted.
    async fn get_mosaic_names(&self, mosaic_ids: &[String]) -> NodeResult<HashMap<String, String>>;

    /// Resolves a namespace id to the mosaic id it aliases.
    async fn resolve_mosaic_alias(&self, namespace_id: &str) -> NodeResult<String>;
}
