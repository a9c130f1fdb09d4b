//! Chronik indexer boundary
//!
//! The wallet never talks HTTP itself. Anything that can answer these
//! queries (a chronik client, a fixture in tests) plugs in here.

use async_trait::async_trait;
use ecash_core::{BlockHeight, IndexerError, TokenId};
use ecash_tx::{GenesisInfo, TokenType, Utxo};
use serde::{Deserialize, Serialize};

/// Token metadata that never changes after genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token_id: TokenId,
    pub token_type: TokenType,
    pub genesis_info: GenesisInfo,
    /// Height the genesis tx confirmed at, `None` while in the mempool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<BlockHeight>,
    /// Collection an NFT1 child belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_token_id: Option<TokenId>,
}

/// Queries the wallet needs from a chronik indexer
#[async_trait]
pub trait ChronikIndexer: Send + Sync {
    /// Every unspent output paying to `address`
    async fn utxos_for_address(&self, address: &str) -> Result<Vec<Utxo>, IndexerError>;

    /// Height of the current chain tip
    async fn chain_tip_height(&self) -> Result<BlockHeight, IndexerError>;

    /// Genesis metadata for `token_id`
    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo, IndexerError>;
}
