//! ecash-tx: UTXO accounting and SLP token utilities for eCash
//!
//! Provides utxo classification, spendability filtering, fee estimation, SLP
//! script encoding and the target outputs Cashtab-style wallets build token
//! txs from.

pub mod amounts;
pub mod coin_selector;
pub mod fees;
pub mod script;
pub mod slp;
pub mod token_ledger;
pub mod token_outputs;
pub mod tx;
pub mod utxo;

pub use amounts::{
    decimalize_token_amount, get_max_decimalized_slp_qty, has_enough_token,
    undecimalize_token_amount, SlpDecimals,
};
pub use coin_selector::{
    balance_sats, is_spendable, max_send_sats, select_sats_utxos, spendable_sats_only_utxos,
    spendable_utxos, CoinSelectorError, SelectedInputs,
};
pub use fees::{calc_tx_fee, estimate_tx_size, P2PKH_INPUT_SIZE, P2PKH_OUTPUT_SIZE};
pub use script::{Op, Script, ScriptError, ScriptReader};
pub use slp::{parse_slp, slp_genesis, slp_mint, slp_send, GenesisInfo, SlpAction, SlpError, SlpPayload};
pub use token_ledger::{
    get_all_send_utxos, get_mint_batons, get_nft, get_nft_child_genesis_input,
    get_nft_parent_fan_inputs, get_send_token_inputs, TokenInputInfo,
};
pub use token_outputs::*;
pub use tx::*;
pub use utxo::{classify, Token, TokenProtocol, TokenType, TokenTypeKind, Utxo, UtxoPartition};
