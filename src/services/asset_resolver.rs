use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{AssetMetadata, AssetReference, MosaicModel};
use crate::error::IngestError;
use crate::ports::LedgerQueryClient;

type PendingLookup = Shared<BoxFuture<'static, AssetMetadata>>;

/// Resolves mosaic display metadata for one pipeline run.
///
/// Every asset id is looked up at most once: the first caller starts the
/// lookup and concurrent or later callers await the same shared future.
pub struct AssetResolver {
    client: Arc<dyn LedgerQueryClient>,
    lookups: Mutex<HashMap<String, PendingLookup>>,
}

impl AssetResolver {
    pub fn new(client: Arc<dyn LedgerQueryClient>) -> Self {
        Self {
            client,
            lookups: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, reference: &AssetReference) -> MosaicModel {
        let metadata = self.metadata(&reference.asset_id).await;
        MosaicModel::new(reference, metadata)
    }

    pub async fn metadata(&self, asset_id: &str) -> AssetMetadata {
        let key = asset_id.to_uppercase();
        let lookup = {
            let mut lookups = self.lookups.lock().await;
            lookups
                .entry(key.clone())
                .or_insert_with(|| lookup_metadata(self.client.clone(), key).boxed().shared())
                .clone()
        };
        lookup.await
    }

    /// Number of distinct asset ids seen so far.
    pub async fn cached(&self) -> usize {
        self.lookups.lock().await.len()
    }
}

/// Namespace ids have the top bit of their first byte set.
fn is_namespace_id(asset_id: &str) -> bool {
    asset_id
        .get(..1)
        .and_then(|nibble| u8::from_str_radix(nibble, 16).ok())
        .map_or(false, |nibble| nibble & 0x8 != 0)
}

async fn lookup_metadata(client: Arc<dyn LedgerQueryClient>, asset_id: String) -> AssetMetadata {
    let mut metadata = AssetMetadata::default();

    let mosaic_id = if is_namespace_id(&asset_id) {
        match client.resolve_mosaic_alias(&asset_id).await {
            Ok(mosaic_id) => mosaic_id,
            Err(e) => {
                record(&mut metadata, &asset_id, IngestError::from(e));
                return metadata;
            }
        }
    } else {
        asset_id.clone()
    };

    let names_request = [mosaic_id.clone()];
    let (info, names) = tokio::join!(
        client.get_mosaic_info(&mosaic_id),
        client.get_mosaic_names(&names_request),
    );

    match info {
        Ok(info) => metadata.divisibility = Some(info.divisibility),
        Err(e) => record(&mut metadata, &asset_id, IngestError::from(e)),
    }

    match names {
        Ok(mut names) => match names.remove(&mosaic_id) {
            Some(name) => metadata.name = Some(name),
            None => record(
                &mut metadata,
                &asset_id,
                IngestError::NotFound(format!("no name registered for mosaic {}", mosaic_id)),
            ),
        },
        Err(e) => record(&mut metadata, &asset_id, IngestError::from(e)),
    }

    debug!(
        asset_id = %asset_id,
        resolved = metadata.is_resolved(),
        "mosaic metadata lookup finished"
    );
    metadata
}

fn record(metadata: &mut AssetMetadata, asset_id: &str, err: IngestError) {
    warn!(asset_id = %asset_id, error = %err, "mosaic metadata lookup degraded");
    metadata.diagnostics.push(err.to_diagnostic());
}
