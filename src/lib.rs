pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod symbol;
pub mod utils;

pub use config::{Config, NetworkDescriptor};
pub use domain::{Address, TransactionModel};
pub use error::IngestError;
pub use ports::LedgerQueryClient;
pub use services::{IngestionPipeline, PipelineOptions};
pub use symbol::SymbolClient;
