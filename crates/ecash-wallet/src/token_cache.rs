//! Token metadata cache
//!
//! Genesis info is immutable, so an entry stays valid until the caller
//! evicts it. Only unconfirmed genesis entries are worth refreshing.

use std::collections::HashMap;

use ecash_core::TokenId;
use serde::{Deserialize, Serialize};

use crate::indexer::TokenInfo;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCache {
    entries: HashMap<TokenId, TokenInfo>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token_id: &TokenId) -> Option<&TokenInfo> {
        self.entries.get(token_id)
    }

    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.entries.contains_key(token_id)
    }

    /// Insert or replace the entry for `info.token_id`
    pub fn insert(&mut self, info: TokenInfo) -> Option<TokenInfo> {
        self.entries.insert(info.token_id.clone(), info)
    }

    pub fn evict(&mut self, token_id: &TokenId) -> Option<TokenInfo> {
        self.entries.remove(token_id)
    }

    /// Drop entries whose genesis was still unconfirmed when cached
    pub fn evict_unconfirmed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, info| info.block_height.is_some());
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
