//! Canonical, UI-agnostic transaction representation.

use serde::Serialize;
use std::sync::Arc;

use super::raw::{RawTransaction, TransactionGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Confirmed,
    Unconfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    Network,
    NotFound,
    MalformedTransaction,
    UnsupportedTransactionKind,
}

/// Records why a value is best-effort rather than fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Display metadata for a mosaic. Fields stay `None` when their lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    pub name: Option<String>,
    pub divisibility: Option<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AssetMetadata {
    pub fn is_resolved(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub asset_id: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicModel {
    pub mosaic_id: String,
    pub mosaic_name: Option<String>,
    pub amount: u64,
    pub relative_amount: Option<String>,
    pub divisibility: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl MosaicModel {
    pub fn new(reference: &AssetReference, metadata: AssetMetadata) -> Self {
        let relative_amount = metadata
            .divisibility
            .map(|divisibility| crate::utils::format::relative_amount(reference.amount, divisibility));
        Self {
            mosaic_id: reference.asset_id.clone(),
            mosaic_name: metadata.name,
            amount: reference.amount,
            relative_amount,
            divisibility: metadata.divisibility,
            diagnostics: metadata.diagnostics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub recipient_address: String,
    pub message_text: Option<String>,
    pub message_encrypted: bool,
    pub mosaics: Vec<MosaicModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsLockDetail {
    pub mosaic: MosaicModel,
    pub duration: u64,
    pub aggregate_hash: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDetail {
    pub inner_transactions: Vec<TransactionModel>,
    pub cosignature_public_keys: Vec<String>,
    /// Fully fetched aggregate, kept for signing flows.
    #[serde(skip)]
    pub raw: Arc<RawTransaction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionDetail {
    Transfer(TransferDetail),
    FundsLock(FundsLockDetail),
    Aggregate(AggregateDetail),
    #[serde(rename_all = "camelCase")]
    Unsupported { transaction_type: u16 },
    /// Normalization failed; only the common fields are meaningful.
    Unresolved,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionModel {
    pub status: TransactionStatus,
    pub group: TransactionGroup,
    pub signer_public_key: Option<String>,
    pub signer_address: Option<String>,
    pub deadline: Option<String>,
    pub hash: Option<String>,
    pub fee: Option<u64>,
    #[serde(flatten)]
    pub detail: TransactionDetail,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl TransactionModel {
    pub fn type_name(&self) -> &'static str {
        match self.detail {
            TransactionDetail::Transfer(_) => "transfer",
            TransactionDetail::FundsLock(_) => "fundsLock",
            TransactionDetail::Aggregate(_) => "aggregate",
            TransactionDetail::Unsupported { .. } => "unsupported",
            TransactionDetail::Unresolved => "unresolved",
        }
    }

    pub fn inner_transactions(&self) -> &[TransactionModel] {
        match &self.detail {
            TransactionDetail::Aggregate(aggregate) => &aggregate.inner_transactions,
            _ => &[],
        }
    }

    /// True when this model, one of its mosaics or any inner transaction carries a diagnostic.
    pub fn is_degraded(&self) -> bool {
        if !self.diagnostics.is_empty() {
            return true;
        }
        match &self.detail {
            TransactionDetail::Transfer(transfer) => transfer
                .mosaics
                .iter()
                .any(|mosaic| !mosaic.diagnostics.is_empty()),
            TransactionDetail::FundsLock(lock) => !lock.mosaic.diagnostics.is_empty(),
            TransactionDetail::Aggregate(aggregate) => aggregate
                .inner_transactions
                .iter()
                .any(TransactionModel::is_degraded),
            TransactionDetail::Unsupported { .. } | TransactionDetail::Unresolved => false,
        }
    }
}
