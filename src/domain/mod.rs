pub mod address;
pub mod model;
pub mod raw;

pub use address::{Address, AddressError, NetworkType};
pub use model::{
    AggregateDetail, AssetMetadata, AssetReference, Diagnostic, DiagnosticKind, FundsLockDetail,
    MosaicModel, TransactionDetail, TransactionModel, TransactionStatus, TransferDetail,
};
pub use raw::{
    AggregatePayload, FundsLockPayload, RawKind, RawMessage, RawMosaic, RawTransaction,
    TransactionGroup, TransactionMeta, TransferPayload,
};
