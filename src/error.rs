use std::time::Duration;
use thiserror::Error;

use crate::domain::{AddressError, Diagnostic, DiagnosticKind};
use crate::ports::NodeError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Unsupported transaction kind: 0x{0:04X}")]
    UnsupportedTransactionKind(u16),

    #[error("Ingestion timed out after {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            IngestError::Network(_) | IngestError::Timeout(_) => DiagnosticKind::Network,
            IngestError::NotFound(_) => DiagnosticKind::NotFound,
            IngestError::MalformedTransaction(_) => DiagnosticKind::MalformedTransaction,
            IngestError::UnsupportedTransactionKind(_) => {
                DiagnosticKind::UnsupportedTransactionKind
            }
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.diagnostic_kind(), self.to_string())
    }
}

impl From<NodeError> for IngestError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::NotFound(what) => IngestError::NotFound(what),
            other => IngestError::Network(other.to_string()),
        }
    }
}

impl From<AddressError> for IngestError {
    fn from(err: AddressError) -> Self {
        IngestError::MalformedTransaction(err.to_string())
    }
}
