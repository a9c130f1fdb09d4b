//! Spendability rules and sats selection
//!
//! Coinbase outputs only become spendable after `COINBASE_MATURITY`
//! confirmations. Token outputs are never selected for a plain sats spend.

use std::fmt;

use ecash_core::constants::{COINBASE_MATURITY, DUST_SATS, MEMPOOL_HEIGHT};
use ecash_core::{BlockHeight, Sats};

use crate::fees::{calc_tx_fee, estimate_tx_size};
use crate::tx::TxOutput;
use crate::utxo::Utxo;

// =============================================================================
// Error type
// =============================================================================

/// Error returned when sats selection cannot satisfy requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinSelectorError {
    InsufficientSats { required: u64, available: u64 },
}

impl fmt::Display for CoinSelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSelectorError::InsufficientSats {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient sats: need {} sats, have {} spendable",
                    required, available
                )
            }
        }
    }
}

impl std::error::Error for CoinSelectorError {}

// =============================================================================
// Spendability
// =============================================================================

/// True if the output may be spent at `tip_height`.
///
/// A coinbase output reported at the mempool height has no confirmations and
/// is never spendable. Heights are widened to i64 so an unsynced tip (0)
/// never underflows into a false positive.
pub fn is_spendable(utxo: &Utxo, tip_height: BlockHeight) -> bool {
    if !utxo.is_coinbase {
        return true;
    }
    if utxo.block_height <= MEMPOOL_HEIGHT {
        return false;
    }
    i64::from(tip_height) - i64::from(utxo.block_height) >= COINBASE_MATURITY
}

/// All spendable outputs that carry no token, in input order.
pub fn spendable_sats_only_utxos(utxos: &[Utxo], tip_height: BlockHeight) -> Vec<Utxo> {
    utxos
        .iter()
        .filter(|utxo| utxo.token.is_none() && is_spendable(utxo, tip_height))
        .cloned()
        .collect()
}

/// All spendable outputs, token outputs included, in input order.
pub fn spendable_utxos(utxos: &[Utxo], tip_height: BlockHeight) -> Vec<Utxo> {
    utxos
        .iter()
        .filter(|utxo| is_spendable(utxo, tip_height))
        .cloned()
        .collect()
}

/// Sum of sats held by outputs without tokens.
///
/// Immature coinbase sats are counted: users expect to see them in their
/// balance even before they can be spent.
pub fn balance_sats(utxos: &[Utxo]) -> u128 {
    utxos
        .iter()
        .filter(|utxo| utxo.is_sats_only())
        .map(|utxo| u128::from(utxo.sats))
        .sum()
}

// =============================================================================
// Selection
// =============================================================================

/// Result of sats selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInputs {
    pub utxos: Vec<Utxo>,
    pub total_sats: u64,
    /// Fee paid by the tx, including any leftover too small for change
    pub fee_sats: u64,
    /// Value of the P2PKH change output, `None` when no change is created
    pub change_sats: Option<u64>,
}

/// Select spendable sats-only outputs to pay `outputs` plus the fee.
///
/// Outputs are taken largest first to minimize the number of inputs, then
/// returned in original order. A change output is added only if it would
/// hold at least `DUST_SATS`; otherwise the leftover goes to the fee.
pub fn select_sats_utxos(
    utxos: &[Utxo],
    tip_height: BlockHeight,
    outputs: &[TxOutput],
    fee_per_kb: Sats,
) -> Result<SelectedInputs, CoinSelectorError> {
    let spendable = spendable_sats_only_utxos(utxos, tip_height);
    let required_sats = outputs
        .iter()
        .fold(0u64, |acc, output| acc.saturating_add(output.sats));

    let mut indices: Vec<usize> = (0..spendable.len()).collect();
    indices.sort_by(|&a, &b| spendable[b].sats.cmp(&spendable[a].sats));

    let mut selected_indices = Vec::new();
    let mut total_sats: u64 = 0;
    let mut settled = None;

    for &idx in &indices {
        selected_indices.push(idx);
        total_sats = total_sats.saturating_add(spendable[idx].sats);
        let num_inputs = selected_indices.len();

        let fee_with_change = calc_tx_fee(estimate_tx_size(num_inputs, outputs, 1), fee_per_kb);
        let change = total_sats
            .checked_sub(required_sats)
            .and_then(|left| left.checked_sub(fee_with_change));
        if let Some(change) = change.filter(|&change| change >= DUST_SATS) {
            settled = Some((fee_with_change, Some(change)));
            break;
        }

        let fee = calc_tx_fee(estimate_tx_size(num_inputs, outputs, 0), fee_per_kb);
        if total_sats >= required_sats.saturating_add(fee) {
            settled = Some((total_sats - required_sats, None));
            break;
        }
    }

    let Some((fee_sats, change_sats)) = settled else {
        let fee = calc_tx_fee(estimate_tx_size(spendable.len(), outputs, 0), fee_per_kb);
        return Err(CoinSelectorError::InsufficientSats {
            required: required_sats.saturating_add(fee),
            available: total_sats,
        });
    };

    selected_indices.sort();
    let utxos = selected_indices
        .iter()
        .map(|&i| spendable[i].clone())
        .collect();

    Ok(SelectedInputs {
        utxos,
        total_sats,
        fee_sats,
        change_sats,
    })
}

/// Largest amount a single P2PKH output can send by sweeping every
/// spendable sats-only output, after the fee and the value of
/// `extra_outputs` (e.g. an OP_RETURN memo).
///
/// Returns 0 when the wallet cannot cover the fee.
pub fn max_send_sats(
    utxos: &[Utxo],
    tip_height: BlockHeight,
    extra_outputs: &[TxOutput],
    fee_per_kb: Sats,
) -> Sats {
    let spendable = spendable_sats_only_utxos(utxos, tip_height);
    if spendable.is_empty() {
        return 0;
    }
    let total_sats = spendable
        .iter()
        .fold(0u64, |acc, utxo| acc.saturating_add(utxo.sats));
    let extra_sats = extra_outputs
        .iter()
        .fold(0u64, |acc, output| acc.saturating_add(output.sats));
    let fee = calc_tx_fee(
        estimate_tx_size(spendable.len(), extra_outputs, 1),
        fee_per_kb,
    );
    total_sats.saturating_sub(extra_sats).saturating_sub(fee)
}
