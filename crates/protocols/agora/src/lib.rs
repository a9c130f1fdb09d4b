//! Agora oneshot offers
//!
//! Agora offers lock a token in a covenant that releases it to whoever
//! creates the enforced outputs. A oneshot offer sells the whole utxo at
//! once, which for an SLP NFT1 child means a single NFT.
//!
//! This crate decodes offers from indexer plugin data and sorts valid NFT
//! listings into the wallet's own listings and everyone else's.

pub mod constants;
pub mod offers;
pub mod plugin;
pub mod state;

pub use constants::AGORA_PLUGIN_NAME;
pub use offers::{get_token_offer_maps, validate_offer, OfferRejection};
pub use plugin::{
    parse_agora_txs, parse_oneshot_offer, read_enforced_outputs, serialize_enforced_outputs,
    OfferUtxo, PluginEntry,
};
pub use state::{AgoraError, AgoraOneshot, Listing, ParsedAgoraTx, SpentBy, TokenOfferMaps};
