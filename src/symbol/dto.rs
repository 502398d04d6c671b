//! Wire shapes of the Symbol REST gateway.
//! Fields are optional wherever the gateway omits them for some transaction
//! kinds; semantic validation happens during normalization.

use serde::{Deserialize, Serialize};

use crate::domain::raw::{
    AGGREGATE_BONDED_TYPE, AGGREGATE_COMPLETE_TYPE, HASH_LOCK_TYPE, TRANSFER_TYPE,
};
use crate::domain::{
    AggregatePayload, FundsLockPayload, RawKind, RawMessage, RawMosaic, RawTransaction,
    TransactionGroup, TransactionMeta, TransferPayload,
};

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    pub data: Vec<TransactionEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    pub id: Option<String>,
    #[serde(default)]
    pub meta: MetaDto,
    pub transaction: TransactionBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDto {
    pub height: Option<String>,
    pub hash: Option<String>,
    pub aggregate_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    #[serde(rename = "type")]
    pub type_code: u16,
    pub signer_public_key: Option<String>,
    pub network: Option<u8>,
    pub max_fee: Option<String>,
    pub deadline: Option<String>,

    pub recipient_address: Option<String>,
    #[serde(default)]
    pub mosaics: Vec<MosaicDto>,
    pub message: Option<MessageDto>,

    pub mosaic: Option<MosaicDto>,
    pub duration: Option<String>,
    pub hash: Option<String>,

    #[serde(default)]
    pub transactions: Vec<TransactionEnvelope>,
    #[serde(default)]
    pub cosignatures: Vec<CosignatureDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MosaicDto {
    pub id: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageDto {
    Hex(String),
    Legacy {
        #[serde(rename = "type")]
        message_type: u8,
        payload: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosignatureDto {
    pub signer_public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MosaicInfoResponse {
    pub mosaic: MosaicInfoDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MosaicInfoDto {
    pub id: String,
    pub divisibility: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicNamesRequest<'a> {
    pub mosaic_ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicNamesResponse {
    pub mosaic_names: Vec<MosaicNamesDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicNamesDto {
    pub mosaic_id: String,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceInfoResponse {
    pub namespace: NamespaceDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceDto {
    pub alias: AliasDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasDto {
    #[serde(rename = "type")]
    pub alias_type: u8,
    pub mosaic_id: Option<String>,
}

impl From<MosaicDto> for RawMosaic {
    fn from(dto: MosaicDto) -> Self {
        RawMosaic {
            id: dto.id,
            amount: dto.amount,
        }
    }
}

impl From<MessageDto> for RawMessage {
    fn from(dto: MessageDto) -> Self {
        match dto {
            MessageDto::Hex(hex) => RawMessage::Hex(hex),
            MessageDto::Legacy {
                message_type,
                payload,
            } => RawMessage::Legacy {
                message_type,
                payload,
            },
        }
    }
}

impl TransactionEnvelope {
    /// Converts the wire shape, tagging it (and any inner transactions) with the group it came from.
    pub fn into_raw(self, group: TransactionGroup) -> RawTransaction {
        let body = self.transaction;
        let kind = match body.type_code {
            TRANSFER_TYPE => RawKind::Transfer(TransferPayload {
                recipient_address: body.recipient_address,
                mosaics: body.mosaics.into_iter().map(RawMosaic::from).collect(),
                message: body.message.map(RawMessage::from),
            }),
            HASH_LOCK_TYPE => RawKind::FundsLock(FundsLockPayload {
                mosaic: body.mosaic.map(RawMosaic::from),
                duration: body.duration,
                hash: body.hash,
            }),
            AGGREGATE_COMPLETE_TYPE | AGGREGATE_BONDED_TYPE => {
                RawKind::Aggregate(AggregatePayload {
                    transactions: body
                        .transactions
                        .into_iter()
                        .map(|inner| inner.into_raw(group))
                        .collect(),
                    cosigner_public_keys: body
                        .cosignatures
                        .into_iter()
                        .map(|cosignature| cosignature.signer_public_key)
                        .collect(),
                })
            }
            _ => RawKind::Other,
        };

        RawTransaction {
            id: self.id,
            group,
            meta: TransactionMeta {
                height: self.meta.height,
                hash: self.meta.hash,
                aggregate_hash: self.meta.aggregate_hash,
            },
            signer_public_key: body.signer_public_key,
            network: body.network,
            type_code: body.type_code,
            max_fee: body.max_fee,
            deadline: body.deadline,
            kind,
        }
    }
}
