//! Conversion of raw ledger transactions into [`TransactionModel`]s.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};

use super::asset_resolver::AssetResolver;
use crate::config::NetworkDescriptor;
use crate::domain::{
    Address, AggregateDetail, AssetReference, Diagnostic, FundsLockDetail, FundsLockPayload,
    NetworkType, RawKind, RawMessage, RawMosaic, RawTransaction, TransactionDetail,
    TransactionGroup, TransactionModel, TransactionStatus, TransferDetail, TransferPayload,
};
use crate::error::IngestError;
use crate::ports::LedgerQueryClient;
use crate::utils::format::format_deadline;

pub const DEFAULT_MAX_AGGREGATE_DEPTH: usize = 4;

const PLAIN_MESSAGE: u8 = 0x00;
const ENCRYPTED_MESSAGE: u8 = 0x01;

pub struct TransactionNormalizer {
    client: Arc<dyn LedgerQueryClient>,
    resolver: Arc<AssetResolver>,
    network: NetworkDescriptor,
    max_depth: usize,
}

struct CommonFields {
    status: TransactionStatus,
    group: TransactionGroup,
    signer_public_key: Option<String>,
    signer_address: Option<String>,
    deadline: Option<String>,
    hash: Option<String>,
    fee: Option<u64>,
}

impl CommonFields {
    fn into_model(self, detail: TransactionDetail, diagnostics: Vec<Diagnostic>) -> TransactionModel {
        TransactionModel {
            status: self.status,
            group: self.group,
            signer_public_key: self.signer_public_key,
            signer_address: self.signer_address,
            deadline: self.deadline,
            hash: self.hash,
            fee: self.fee,
            detail,
            diagnostics,
        }
    }
}

impl TransactionNormalizer {
    pub fn new(
        client: Arc<dyn LedgerQueryClient>,
        resolver: Arc<AssetResolver>,
        network: NetworkDescriptor,
        max_depth: usize,
    ) -> Self {
        Self {
            client,
            resolver,
            network,
            max_depth,
        }
    }

    pub async fn normalize(&self, raw: &RawTransaction) -> Result<TransactionModel, IngestError> {
        self.normalize_at(raw, 0).await
    }

    /// Builds a common-fields-only model carrying the error that stopped normalization.
    pub fn unresolved(&self, raw: &RawTransaction, err: &IngestError) -> TransactionModel {
        let (common, mut diagnostics) = self.common_fields(raw);
        diagnostics.push(err.to_diagnostic());
        common.into_model(TransactionDetail::Unresolved, diagnostics)
    }

    fn normalize_at<'a>(
        &'a self,
        raw: &'a RawTransaction,
        depth: usize,
    ) -> BoxFuture<'a, Result<TransactionModel, IngestError>> {
        async move {
            let (common, mut diagnostics) = self.common_fields(raw);

            let detail = match &raw.kind {
                RawKind::Transfer(payload) => TransactionDetail::Transfer(self.transfer(payload).await?),
                RawKind::FundsLock(payload) => {
                    TransactionDetail::FundsLock(self.funds_lock(payload).await?)
                }
                RawKind::Aggregate(_) => TransactionDetail::Aggregate(self.aggregate(raw, depth).await?),
                RawKind::Other => {
                    let err = IngestError::UnsupportedTransactionKind(raw.type_code);
                    debug!(hash = ?raw.hash(), error = %err, "transaction kind not modelled");
                    diagnostics.push(err.to_diagnostic());
                    TransactionDetail::Unsupported {
                        transaction_type: raw.type_code,
                    }
                }
            };

            Ok(common.into_model(detail, diagnostics))
        }
        .boxed()
    }

    async fn transfer(&self, payload: &TransferPayload) -> Result<TransferDetail, IngestError> {
        let recipient = payload
            .recipient_address
            .as_deref()
            .ok_or_else(|| malformed("transfer has no recipient"))?;
        let recipient_address = parse_address(recipient)?.pretty();
        let (message_text, message_encrypted) = decode_message(payload.message.as_ref())?;

        let references = payload
            .mosaics
            .iter()
            .map(asset_reference)
            .collect::<Result<Vec<_>, _>>()?;
        let mosaics = join_all(references.iter().map(|reference| self.resolver.resolve(reference))).await;

        Ok(TransferDetail {
            recipient_address,
            message_text,
            message_encrypted,
            mosaics,
        })
    }

    async fn funds_lock(&self, payload: &FundsLockPayload) -> Result<FundsLockDetail, IngestError> {
        let mosaic = payload
            .mosaic
            .as_ref()
            .ok_or_else(|| malformed("funds lock has no mosaic"))?;
        let reference = asset_reference(mosaic)?;
        let duration = payload
            .duration
            .as_deref()
            .ok_or_else(|| malformed("funds lock has no duration"))
            .and_then(|duration| parse_u64("duration", duration))?;
        let aggregate_hash = payload
            .hash
            .clone()
            .ok_or_else(|| malformed("funds lock has no aggregate hash"))?;

        Ok(FundsLockDetail {
            mosaic: self.resolver.resolve(&reference).await,
            duration,
            aggregate_hash,
        })
    }

    /// Search results omit aggregate inner transactions, so a top-level
    /// aggregate is fetched again in full. Nested aggregates already carry
    /// theirs inside the fetched parent.
    async fn aggregate(&self, raw: &RawTransaction, depth: usize) -> Result<AggregateDetail, IngestError> {
        if depth >= self.max_depth {
            return Err(malformed(format!(
                "aggregate nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }

        let full = if depth == 0 {
            let id = raw
                .id
                .as_deref()
                .ok_or_else(|| malformed("aggregate has no id to fetch its payload with"))?;
            Arc::new(self.client.get_full_transaction(id, raw.group).await?)
        } else {
            Arc::new(raw.clone())
        };

        let RawKind::Aggregate(payload) = &full.kind else {
            return Err(malformed(format!(
                "full payload of {} is not an aggregate",
                raw.id.as_deref().unwrap_or("aggregate")
            )));
        };

        // A broken inner transaction degrades alone; its siblings stay intact.
        let aggregate_hash = full.hash();
        let inner_transactions = join_all(payload.transactions.iter().map(|inner| async move {
            match self.normalize_at(inner, depth + 1).await {
                Ok(model) => model,
                Err(e) => {
                    warn!(aggregate = ?aggregate_hash, error = %e, "inner transaction degraded");
                    self.unresolved(inner, &e)
                }
            }
        }))
        .await;

        Ok(AggregateDetail {
            inner_transactions,
            cosignature_public_keys: payload.cosigner_public_keys.clone(),
            raw: full.clone(),
        })
    }

    fn common_fields(&self, raw: &RawTransaction) -> (CommonFields, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let network = raw.network.map(NetworkType).unwrap_or(self.network.network_type);

        let signer_address = raw.signer_public_key.as_deref().and_then(|key| {
            keep(
                &mut diagnostics,
                Address::from_public_key(key, network)
                    .map(|address| address.pretty())
                    .map_err(IngestError::from),
            )
        });
        let fee = raw
            .max_fee
            .as_deref()
            .and_then(|fee| keep(&mut diagnostics, parse_u64("maxFee", fee)));
        let deadline = raw
            .deadline
            .as_deref()
            .and_then(|deadline| keep(&mut diagnostics, parse_u64("deadline", deadline)));
        let deadline = deadline.and_then(|deadline| {
            let formatted = format_deadline(deadline, self.network.epoch_adjustment)
                .ok_or_else(|| malformed(format!("deadline {} is out of range", deadline)));
            keep(&mut diagnostics, formatted)
        });

        let status = if raw.is_confirmed() {
            TransactionStatus::Confirmed
        } else {
            TransactionStatus::Unconfirmed
        };

        let common = CommonFields {
            status,
            group: raw.group,
            signer_public_key: raw.signer_public_key.clone(),
            signer_address,
            deadline,
            hash: raw.meta.hash.clone(),
            fee,
        };
        (common, diagnostics)
    }
}

fn keep<T>(diagnostics: &mut Vec<Diagnostic>, result: Result<T, IngestError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            diagnostics.push(e.to_diagnostic());
            None
        }
    }
}

fn malformed(reason: impl Into<String>) -> IngestError {
    IngestError::MalformedTransaction(reason.into())
}

fn parse_u64(field: &str, value: &str) -> Result<u64, IngestError> {
    value
        .parse::<u64>()
        .map_err(|e| malformed(format!("{} {:?} is not a valid integer: {}", field, value, e)))
}

fn asset_reference(mosaic: &RawMosaic) -> Result<AssetReference, IngestError> {
    if mosaic.id.len() != 16 || !mosaic.id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed(format!("invalid mosaic id {:?}", mosaic.id)));
    }
    Ok(AssetReference {
        asset_id: mosaic.id.to_uppercase(),
        amount: parse_u64("amount", &mosaic.amount)?,
    })
}

/// Gateways send the 48 hex character encoded form; plain and pretty forms are accepted too.
fn parse_address(raw: &str) -> Result<Address, IngestError> {
    let address = if raw.len() == 48 {
        Address::from_encoded_hex(raw)?
    } else {
        Address::from_raw(raw)?
    };
    Ok(address)
}

fn decode_message(message: Option<&RawMessage>) -> Result<(Option<String>, bool), IngestError> {
    match message {
        None => Ok((None, false)),
        Some(RawMessage::Hex(encoded)) => {
            let bytes = hex::decode(encoded)
                .map_err(|e| malformed(format!("message is not valid hex: {}", e)))?;
            match bytes.split_first() {
                Some((message_type, payload)) => Ok(message_text(*message_type, payload)),
                None => Ok((None, false)),
            }
        }
        Some(RawMessage::Legacy {
            message_type,
            payload,
        }) => {
            let bytes = hex::decode(payload)
                .map_err(|e| malformed(format!("message payload is not valid hex: {}", e)))?;
            Ok(message_text(*message_type, &bytes))
        }
    }
}

fn message_text(message_type: u8, payload: &[u8]) -> (Option<String>, bool) {
    match message_type {
        PLAIN_MESSAGE => (Some(String::from_utf8_lossy(payload).into_owned()), false),
        // encrypted payloads are hex text already
        ENCRYPTED_MESSAGE => (Some(String::from_utf8_lossy(payload).into_owned()), true),
        _ => (Some(hex::encode_upper(payload)), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_hex_message() {
        let message = RawMessage::Hex("0048656C6C6F".to_string());
        assert_eq!(
            decode_message(Some(&message)).unwrap(),
            (Some("Hello".to_string()), false)
        );
    }

    #[test]
    fn test_encrypted_legacy_message() {
        let message = RawMessage::Legacy {
            message_type: 1,
            payload: hex::encode("A1B2C3"),
        };
        assert_eq!(
            decode_message(Some(&message)).unwrap(),
            (Some("A1B2C3".to_string()), true)
        );
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(
            decode_message(Some(&RawMessage::Hex(String::new()))).unwrap(),
            (None, false)
        );
        assert_eq!(decode_message(None).unwrap(), (None, false));
    }

    #[test]
    fn test_invalid_message_hex_is_malformed() {
        let message = RawMessage::Hex("0G".to_string());
        assert!(matches!(
            decode_message(Some(&message)),
            Err(IngestError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_asset_reference_validation() {
        let good = RawMosaic {
            id: "72c0212e67a08bce".to_string(),
            amount: "1000000".to_string(),
        };
        assert_eq!(
            asset_reference(&good).unwrap(),
            AssetReference {
                asset_id: "72C0212E67A08BCE".to_string(),
                amount: 1_000_000
            }
        );

        let bad_amount = RawMosaic {
            amount: "-1".to_string(),
            ..good.clone()
        };
        assert!(asset_reference(&bad_amount).is_err());

        let bad_id = RawMosaic {
            id: "XYZ".to_string(),
            ..good
        };
        assert!(asset_reference(&bad_id).is_err());
    }
}
