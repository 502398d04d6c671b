//! Symbol account addresses.
//! An address is 24 bytes: network byte, RIPEMD-160 of the SHA3-256 public key
//! hash, and a 3-byte SHA3-256 checksum. Its plain form is 39 base32 characters.

use data_encoding::BASE32;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use thiserror::Error;

const DECODED_LEN: usize = 24;
const PLAIN_LEN: usize = 39;
const CHECKSUM_LEN: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: {0}")]
    InvalidLength(usize),
    #[error("Invalid address encoding: {0}")]
    InvalidEncoding(String),
    #[error("Address checksum mismatch: {0}")]
    ChecksumMismatch(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Network identifier byte carried by every address and transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkType(pub u8);

impl NetworkType {
    pub const MAINNET: NetworkType = NetworkType(104);
    pub const TESTNET: NetworkType = NetworkType(152);

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mainnet" => Some(Self::MAINNET),
            "testnet" => Some(Self::TESTNET),
            other => other.parse::<u8>().ok().map(NetworkType),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MAINNET => write!(f, "mainnet"),
            Self::TESTNET => write!(f, "testnet"),
            NetworkType(other) => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    decoded: [u8; DECODED_LEN],
}

impl Address {
    /// Parses a plain (`TB...`) or pretty (`TB....-....`) address and verifies its checksum.
    pub fn from_raw(raw: &str) -> Result<Self, AddressError> {
        let plain: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_uppercase();
        if plain.len() != PLAIN_LEN {
            return Err(AddressError::InvalidLength(plain.len()));
        }

        let padded = format!("{}A", plain);
        let bytes = BASE32
            .decode(padded.as_bytes())
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        let mut decoded = [0u8; DECODED_LEN];
        decoded.copy_from_slice(&bytes[..DECODED_LEN]);

        let address = Address { decoded };
        if !address.has_valid_checksum() {
            return Err(AddressError::ChecksumMismatch(plain));
        }
        Ok(address)
    }

    /// Decodes the 48 hex character form the REST gateway uses for addresses.
    pub fn from_encoded_hex(encoded: &str) -> Result<Self, AddressError> {
        let bytes =
            hex::decode(encoded.trim()).map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
        if bytes.len() != DECODED_LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut decoded = [0u8; DECODED_LEN];
        decoded.copy_from_slice(&bytes);
        Ok(Address { decoded })
    }

    pub fn from_public_key(public_key: &str, network: NetworkType) -> Result<Self, AddressError> {
        let key = hex::decode(public_key.trim())
            .map_err(|e| AddressError::InvalidPublicKey(e.to_string()))?;
        if key.len() != 32 {
            return Err(AddressError::InvalidPublicKey(format!(
                "expected 32 bytes, got {}",
                key.len()
            )));
        }

        let key_hash = Sha3_256::digest(&key);
        let ripemd_hash = Ripemd160::digest(key_hash);

        let mut decoded = [0u8; DECODED_LEN];
        decoded[0] = network.0;
        decoded[1..21].copy_from_slice(&ripemd_hash);
        let checksum = Sha3_256::digest(&decoded[..21]);
        decoded[21..].copy_from_slice(&checksum[..CHECKSUM_LEN]);

        Ok(Address { decoded })
    }

    pub fn network_type(&self) -> NetworkType {
        NetworkType(self.decoded[0])
    }

    /// Namespace alias addresses set the low bit of the network byte.
    pub fn is_alias(&self) -> bool {
        self.decoded[0] & 0x01 == 0x01
    }

    pub fn plain(&self) -> String {
        let mut padded = [0u8; DECODED_LEN + 1];
        padded[..DECODED_LEN].copy_from_slice(&self.decoded);
        let mut encoded = BASE32.encode(&padded);
        encoded.truncate(PLAIN_LEN);
        encoded
    }

    pub fn pretty(&self) -> String {
        let plain = self.plain();
        plain
            .as_bytes()
            .chunks(6)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }

    fn has_valid_checksum(&self) -> bool {
        let checksum = Sha3_256::digest(&self.decoded[..21]);
        checksum[..CHECKSUM_LEN] == self.decoded[21..]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain())
    }
}
