//! Ledger transactions as received from the node, before normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRANSFER_TYPE: u16 = 0x4154;
pub const HASH_LOCK_TYPE: u16 = 0x4148;
pub const AGGREGATE_COMPLETE_TYPE: u16 = 0x4141;
pub const AGGREGATE_BONDED_TYPE: u16 = 0x4241;

/// Visibility group a transaction was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionGroup {
    Confirmed,
    Unconfirmed,
    Partial,
}

impl TransactionGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionGroup::Confirmed => "confirmed",
            TransactionGroup::Unconfirmed => "unconfirmed",
            TransactionGroup::Partial => "partial",
        }
    }
}

impl fmt::Display for TransactionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMeta {
    pub height: Option<String>,
    pub hash: Option<String>,
    pub aggregate_hash: Option<String>,
}

impl TransactionMeta {
    /// Only transactions included in a block carry a non-zero height.
    pub fn is_confirmed(&self) -> bool {
        self.height
            .as_deref()
            .and_then(|height| height.parse::<u64>().ok())
            .map_or(false, |height| height > 0)
    }
}

/// Mosaic id and amount exactly as the node sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMosaic {
    pub id: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessage {
    /// Current gateways send the message as hex with the type in the first byte.
    Hex(String),
    Legacy { message_type: u8, payload: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferPayload {
    pub recipient_address: Option<String>,
    pub mosaics: Vec<RawMosaic>,
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundsLockPayload {
    pub mosaic: Option<RawMosaic>,
    pub duration: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatePayload {
    /// Empty in search results; populated by the full transaction fetch.
    pub transactions: Vec<RawTransaction>,
    pub cosigner_public_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawKind {
    Transfer(TransferPayload),
    FundsLock(FundsLockPayload),
    Aggregate(AggregatePayload),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub id: Option<String>,
    pub group: TransactionGroup,
    pub meta: TransactionMeta,
    pub signer_public_key: Option<String>,
    pub network: Option<u8>,
    pub type_code: u16,
    pub max_fee: Option<String>,
    pub deadline: Option<String>,
    pub kind: RawKind,
}

impl RawTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.meta.is_confirmed()
    }

    pub fn hash(&self) -> Option<&str> {
        self.meta.hash.as_deref()
    }
}
