//! In-memory indexer for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ecash_core::{BlockHeight, IndexerError, Outpoint, TokenId};
use ecash_tx::{GenesisInfo, Token, TokenType, Utxo};

use crate::indexer::{ChronikIndexer, TokenInfo};

pub const TOKEN_A: &str = "aaaa000000000000000000000000000000000000000000000000000000000000";
pub const TOKEN_B: &str = "bbbb000000000000000000000000000000000000000000000000000000000000";

pub fn mock_utxo(txid_byte: u8, sats: u64) -> Utxo {
    Utxo {
        outpoint: Outpoint::new(format!("{:02x}", txid_byte).repeat(32), 0),
        block_height: 800_000,
        is_coinbase: false,
        sats,
        token: None,
    }
}

pub fn mock_token_utxo(txid_byte: u8, token_id: &str, atoms: u64) -> Utxo {
    Utxo {
        token: Some(Token {
            token_id: TokenId::new(token_id),
            token_type: TokenType::slp_fungible(),
            atoms,
            is_mint_baton: false,
        }),
        ..mock_utxo(txid_byte, 546)
    }
}

pub fn mock_coinbase(txid_byte: u8, sats: u64, block_height: BlockHeight) -> Utxo {
    Utxo {
        is_coinbase: true,
        block_height,
        ..mock_utxo(txid_byte, sats)
    }
}

pub struct MockIndexer {
    utxos: Mutex<Result<Vec<Utxo>, IndexerError>>,
    tip: Mutex<BlockHeight>,
    tokens: HashMap<TokenId, TokenInfo>,
    delay: Option<Duration>,
    pub token_info_calls: AtomicUsize,
}

impl MockIndexer {
    pub fn new(utxos: Vec<Utxo>, tip: BlockHeight) -> Self {
        Self {
            utxos: Mutex::new(Ok(utxos)),
            tip: Mutex::new(tip),
            tokens: HashMap::new(),
            delay: None,
            token_info_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_token(mut self, token_id: &str, decimals: u8) -> Self {
        let token_id = TokenId::new(token_id);
        self.tokens.insert(
            token_id.clone(),
            TokenInfo {
                token_id,
                token_type: TokenType::slp_fungible(),
                genesis_info: GenesisInfo {
                    token_ticker: "MOCK".into(),
                    token_name: "Mock Token".into(),
                    decimals,
                    ..Default::default()
                },
                block_height: Some(700_000),
                group_token_id: None,
            },
        );
        self
    }

    pub fn fail_utxos(&self, err: IndexerError) {
        *self.utxos.lock().unwrap() = Err(err);
    }

    pub fn set_tip(&self, tip: BlockHeight) {
        *self.tip.lock().unwrap() = tip;
    }

    async fn maybe_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChronikIndexer for MockIndexer {
    async fn utxos_for_address(&self, _address: &str) -> Result<Vec<Utxo>, IndexerError> {
        self.maybe_delay().await;
        self.utxos.lock().unwrap().clone()
    }

    async fn chain_tip_height(&self) -> Result<BlockHeight, IndexerError> {
        self.maybe_delay().await;
        Ok(*self.tip.lock().unwrap())
    }

    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo, IndexerError> {
        self.token_info_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token_id)
            .cloned()
            .ok_or_else(|| IndexerError::TokenNotFound {
                token_id: token_id.to_string(),
            })
    }
}
