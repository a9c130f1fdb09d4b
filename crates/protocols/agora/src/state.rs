//! Agora offer state types

use std::collections::HashMap;

use ecash_core::{Outpoint, PublicKey, Sats, TokenId};
use ecash_tx::{TxBuilderInput, TxOutput};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters of a oneshot covenant: the outputs a taker must create, and
/// the key that can cancel the offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgoraOneshot {
    /// Index 0 moves the token, index 1 onward pays the seller
    pub enforced_outputs: Vec<TxOutput>,
    pub cancel_pk: PublicKey,
}

/// Spending tx of an offer that is no longer open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentBy {
    pub txid: String,
    pub input_idx: u32,
}

/// A oneshot offer as advertised on chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAgoraTx {
    pub params: AgoraOneshot,
    pub outpoint: Outpoint,
    pub tx_builder_input: TxBuilderInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent_by: Option<SpentBy>,
}

/// An open offer, ready to be taken or canceled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub params: AgoraOneshot,
    pub tx_builder_input: TxBuilderInput,
}

impl Listing {
    /// Total sats the taker pays the seller
    pub fn price_sats(&self) -> Sats {
        self.params
            .enforced_outputs
            .iter()
            .skip(1)
            .fold(0, |acc, output| acc.saturating_add(output.sats))
    }
}

/// Valid open offers keyed by the offered token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOfferMaps {
    /// Offers this wallet can cancel
    pub my_listings: HashMap<TokenId, Listing>,
    /// Offers from everyone else
    pub offered_listings: HashMap<TokenId, Listing>,
}

impl TokenOfferMaps {
    pub fn is_empty(&self) -> bool {
        self.my_listings.is_empty() && self.offered_listings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgoraError {
    #[error("get_token_offer_maps called with undefined publicKey")]
    MissingPublicKey,

    #[error("Utxo carries no agora plugin entry")]
    MissingPluginEntry,

    #[error("Unsupported covenant variant {0}")]
    UnsupportedVariant(String),

    #[error("Oneshot offers must hold an SLP token")]
    NotSlpToken,

    #[error("Plugin groups have no cancel public key")]
    MissingCancelPk,

    #[error("Malformed plugin data: {0}")]
    InvalidPluginData(String),

    #[error("Failed to build enforced outputs: {0}")]
    Slp(#[from] ecash_tx::SlpError),
}
