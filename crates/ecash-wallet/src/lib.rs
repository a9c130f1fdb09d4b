//! ecash-wallet: Wallet state synced from a chronik indexer
//!
//! The wallet holds one `{utxos, tip_height}` snapshot. A sync either
//! replaces the whole snapshot or leaves it untouched, so readers never see
//! utxos from one sync paired with the tip of another.

pub mod balances;
pub mod indexer;
pub mod token_cache;

#[cfg(test)]
mod mock;

use std::sync::Arc;
use std::time::Duration;

use ecash_core::{BlockHeight, IndexerError, Sats, TokenId, WalletConfig};
use ecash_tx::{
    classify, coin_selector, token_ledger, CoinSelectorError, SelectedInputs, TxOutput, Utxo,
    UtxoPartition,
};
use tokio::sync::RwLock;

pub use balances::get_token_balances;
pub use indexer::{ChronikIndexer, TokenInfo};
pub use token_cache::TokenCache;

/// Result type for wallet operations
pub type Result<T> = std::result::Result<T, IndexerError>;

/// The utxo set and the chain tip it was fetched at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub utxos: Vec<Utxo>,
    /// 0 until the first successful sync
    pub tip_height: BlockHeight,
}

impl WalletState {
    pub fn partition(&self) -> UtxoPartition {
        classify(&self.utxos)
    }

    pub fn spendable_sats_only_utxos(&self) -> Vec<Utxo> {
        coin_selector::spendable_sats_only_utxos(&self.utxos, self.tip_height)
    }

    pub fn balance_sats(&self) -> u128 {
        coin_selector::balance_sats(&self.utxos)
    }

    pub fn max_send_sats(&self, extra_outputs: &[TxOutput], fee_per_kb: Sats) -> Sats {
        coin_selector::max_send_sats(&self.utxos, self.tip_height, extra_outputs, fee_per_kb)
    }
}

/// Wallet bound to a set of addresses and an indexer
pub struct Wallet<C: ChronikIndexer> {
    indexer: Arc<C>,
    addresses: Vec<String>,
    config: WalletConfig,
    state: Arc<RwLock<WalletState>>,
}

impl<C: ChronikIndexer> Clone for Wallet<C> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
            addresses: self.addresses.clone(),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: ChronikIndexer> Wallet<C> {
    pub fn new(
        indexer: Arc<C>,
        addresses: Vec<String>,
        config: WalletConfig,
    ) -> ecash_core::Result<Self> {
        config.validate()?;
        if addresses.is_empty() {
            return Err(ecash_core::Error::Config("wallet has no addresses".into()));
        }
        Ok(Self {
            indexer,
            addresses,
            config,
            state: Arc::new(RwLock::new(WalletState::default())),
        })
    }

    pub fn indexer(&self) -> &C {
        &self.indexer
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.chronik.request_timeout_secs)
    }

    /// Fetch utxos for every address plus the chain tip, then install them.
    ///
    /// Any failed or timed-out request aborts the sync and the previous
    /// snapshot stays in place.
    pub async fn sync(&self) -> Result<()> {
        let timeout = self.request_timeout();

        let fetched = async {
            let tip_height = timed_request(timeout, self.indexer.chain_tip_height()).await?;
            let mut utxos = Vec::new();
            for address in &self.addresses {
                utxos.extend(timed_request(timeout, self.indexer.utxos_for_address(address)).await?);
            }
            Ok::<_, IndexerError>(WalletState { utxos, tip_height })
        }
        .await;

        match fetched {
            Ok(new_state) => {
                tracing::info!(
                    utxos = new_state.utxos.len(),
                    tip_height = new_state.tip_height,
                    "Wallet synced"
                );
                *self.state.write().await = new_state;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Sync failed, keeping previous wallet state: {}", e);
                Err(e)
            }
        }
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> WalletState {
        self.state.read().await.clone()
    }

    pub async fn tip_height(&self) -> BlockHeight {
        self.state.read().await.tip_height
    }

    pub async fn spendable_sats_only_utxos(&self) -> Vec<Utxo> {
        self.state.read().await.spendable_sats_only_utxos()
    }

    pub async fn balance_sats(&self) -> u128 {
        self.state.read().await.balance_sats()
    }

    /// Most sats one P2PKH output can send at the configured fee rate
    pub async fn max_send_sats(&self, extra_outputs: &[TxOutput]) -> Sats {
        self.state
            .read()
            .await
            .max_send_sats(extra_outputs, self.config.fee_per_kb)
    }

    /// Pick inputs paying `outputs` plus the fee at the configured rate
    pub async fn select_sats_utxos(
        &self,
        outputs: &[TxOutput],
    ) -> std::result::Result<SelectedInputs, CoinSelectorError> {
        let state = self.state.read().await;
        coin_selector::select_sats_utxos(
            &state.utxos,
            state.tip_height,
            outputs,
            self.config.fee_per_kb,
        )
    }

    pub async fn token_utxos(&self) -> Vec<Utxo> {
        self.state.read().await.partition().token_utxos
    }

    pub async fn mint_batons(&self, token_id: &TokenId) -> Vec<Utxo> {
        token_ledger::get_mint_batons(&self.state.read().await.utxos, token_id)
    }

    /// Decimalized balance of every token the wallet holds
    pub async fn token_balances(
        &self,
        cache: &mut TokenCache,
    ) -> Result<std::collections::HashMap<TokenId, String>> {
        let token_utxos = self.token_utxos().await;
        get_token_balances(self.indexer.as_ref(), &token_utxos, cache).await
    }
}

async fn timed_request<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| IndexerError::Timeout {
            secs: timeout.as_secs(),
        })?
}
