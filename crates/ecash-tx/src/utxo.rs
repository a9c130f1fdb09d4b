//! Wallet UTXO model and classification
//!
//! Utxos arrive from the indexer in one flat list. Token-carrying outputs must
//! never be swept into a plain sats spend, so every consumer starts from the
//! partition built here.

use ecash_core::{BlockHeight, Outpoint, Sats, TokenId};
use serde::{Deserialize, Serialize};

use crate::slp;

/// Token protocol an output's token entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenProtocol {
    Slp,
    Alp,
}

/// Token type as reported by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenTypeKind {
    SlpTokenTypeFungible,
    SlpTokenTypeMintVault,
    SlpTokenTypeNft1Group,
    SlpTokenTypeNft1Child,
    SlpTokenTypeUnknown,
    AlpTokenTypeStandard,
    AlpTokenTypeUnknown,
    /// Any type name this crate does not know yet
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenType {
    pub protocol: TokenProtocol,
    #[serde(rename = "type")]
    pub kind: TokenTypeKind,
    pub number: u8,
}

impl TokenType {
    pub const fn slp_fungible() -> Self {
        Self {
            protocol: TokenProtocol::Slp,
            kind: TokenTypeKind::SlpTokenTypeFungible,
            number: slp::SLP_FUNGIBLE,
        }
    }

    pub const fn slp_mint_vault() -> Self {
        Self {
            protocol: TokenProtocol::Slp,
            kind: TokenTypeKind::SlpTokenTypeMintVault,
            number: slp::SLP_MINT_VAULT,
        }
    }

    pub const fn slp_nft1_group() -> Self {
        Self {
            protocol: TokenProtocol::Slp,
            kind: TokenTypeKind::SlpTokenTypeNft1Group,
            number: slp::SLP_NFT1_GROUP,
        }
    }

    pub const fn slp_nft1_child() -> Self {
        Self {
            protocol: TokenProtocol::Slp,
            kind: TokenTypeKind::SlpTokenTypeNft1Child,
            number: slp::SLP_NFT1_CHILD,
        }
    }

    pub const fn alp_standard() -> Self {
        Self {
            protocol: TokenProtocol::Alp,
            kind: TokenTypeKind::AlpTokenTypeStandard,
            number: 0,
        }
    }

    pub fn is_slp(&self) -> bool {
        self.protocol == TokenProtocol::Slp
    }
}

/// Token entry attached to an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_id: TokenId,
    pub token_type: TokenType,
    /// Quantity in base units. Always 0 for a mint baton.
    pub atoms: u64,
    pub is_mint_baton: bool,
}

/// A spendable output owned by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub outpoint: Outpoint,
    /// Confirmation height, -1 while unconfirmed
    pub block_height: BlockHeight,
    pub is_coinbase: bool,
    pub sats: Sats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
}

impl Utxo {
    pub fn is_sats_only(&self) -> bool {
        self.token.is_none()
    }

    pub fn is_mint_baton(&self) -> bool {
        matches!(&self.token, Some(token) if token.is_mint_baton)
    }

    /// True if this output carries `token_id`, baton or not
    pub fn holds_token(&self, token_id: &TokenId) -> bool {
        matches!(&self.token, Some(token) if &token.token_id == token_id)
    }
}

/// A utxo set split by what each output carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPartition {
    pub sats_only: Vec<Utxo>,
    pub token_utxos: Vec<Utxo>,
    /// Subset of `token_utxos` flagged as mint batons
    pub mint_batons: Vec<Utxo>,
}

impl UtxoPartition {
    /// Number of distinct input utxos covered by the partition
    pub fn len(&self) -> usize {
        self.sats_only.len() + self.token_utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition utxos into sats-only and token utxos, preserving input order.
///
/// Every input lands in exactly one of `sats_only` / `token_utxos`. An output
/// with zero sats and no token is still sats-only.
pub fn classify(utxos: &[Utxo]) -> UtxoPartition {
    let mut partition = UtxoPartition::default();
    for utxo in utxos {
        match &utxo.token {
            None => partition.sats_only.push(utxo.clone()),
            Some(token) => {
                if token.is_mint_baton {
                    partition.mint_batons.push(utxo.clone());
                }
                partition.token_utxos.push(utxo.clone());
            }
        }
    }
    partition
}
