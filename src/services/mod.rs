pub mod asset_resolver;
pub mod group_fetcher;
pub mod normalizer;
pub mod pipeline;

pub use asset_resolver::AssetResolver;
pub use group_fetcher::TransactionGroupFetcher;
pub use normalizer::TransactionNormalizer;
pub use pipeline::{IngestionPipeline, PipelineOptions};
