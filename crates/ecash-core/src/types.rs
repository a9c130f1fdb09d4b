//! Core type definitions for the wallet engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction ID (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token ID (32 bytes, hex-encoded)
///
/// A token ID is the txid of the token's genesis transaction. Lookups compare
/// the hex string as-is, so a malformed ID simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build from the raw 32 bytes found in a token script
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into raw bytes, `None` unless this is 64 hex chars
    pub fn to_bytes(&self) -> Option<[u8; 32]> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(&self.0, &mut out).ok()?;
        Some(out)
    }

    pub fn is_valid(&self) -> bool {
        self.to_bytes().is_some()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    pub txid: TxId,
    pub out_idx: u32,
}

impl Outpoint {
    pub fn new(txid: impl Into<String>, out_idx: u32) -> Self {
        Self {
            txid: TxId::new(txid),
            out_idx,
        }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.out_idx)
    }
}

/// Compressed secp256k1 public key (33 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "hex::serde")] pub Vec<u8>);

impl PublicKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Cashaddr prefix used for addresses on this network
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "ecash",
            Self::Testnet => "ectest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Block height. Unconfirmed outputs are reported at height -1.
pub type BlockHeight = i32;

/// Satoshi amount (1 XEC = 100 sats)
pub type Sats = u64;

/// Constants
pub mod constants {
    use super::Sats;

    /// Value of the dust outputs that carry tokens
    pub const DUST_SATS: Sats = 546;

    /// Fee rate used when none is configured, in sats per 1000 bytes
    pub const DEFAULT_FEE_SATS_PER_KB: Sats = 1000;

    /// Confirmations a coinbase output needs before it can be spent
    pub const COINBASE_MATURITY: i64 = 100;

    /// Largest atom quantity a single SLP output can carry (0xffffffffffffffff)
    pub const MAX_OUTPUT_AMOUNT_SLP_ATOMS: u64 = u64::MAX;

    /// Height reported by the indexer for unconfirmed outputs
    pub const MEMPOOL_HEIGHT: i32 = -1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_validity() {
        assert!(TokenId::new("11".repeat(32)).is_valid());
        assert!(!TokenId::new("11".repeat(31)).is_valid());
        assert!(!TokenId::new("zz".repeat(32)).is_valid());
        assert!(!TokenId::new("").is_valid());
    }

    #[test]
    fn test_token_id_bytes_round_trip() {
        let bytes = [0xab; 32];
        let token_id = TokenId::from_bytes(&bytes);
        assert_eq!(token_id.as_str(), "ab".repeat(32));
        assert_eq!(token_id.to_bytes(), Some(bytes));
    }

    #[test]
    fn test_outpoint_display() {
        let outpoint = Outpoint::new("00".repeat(32), 1);
        assert_eq!(outpoint.to_string(), format!("{}:1", "00".repeat(32)));
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Testnet.address_prefix(), "ectest");
    }

    #[test]
    fn test_max_slp_atoms() {
        assert_eq!(
            constants::MAX_OUTPUT_AMOUNT_SLP_ATOMS.to_string(),
            "18446744073709551615"
        );
    }
}
