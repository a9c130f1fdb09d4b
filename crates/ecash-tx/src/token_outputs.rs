//! Target outputs for SLP transactions
//!
//! Every SLP transaction puts its OP_RETURN at output 0. Token quantities
//! land on the dust outputs that follow, in the order of the SEND amounts.
//! Outputs built with [`TargetOutput::token_dust_change`] are later paid to
//! the wallet's own change script.

use std::fmt;

use ecash_core::constants::DUST_SATS;
use ecash_core::{TokenError, TokenId};

use crate::amounts::{undecimalize_token_amount, SlpDecimals};
use crate::script::Script;
use crate::slp::{
    slp_genesis, slp_mint, slp_send, GenesisInfo, SlpError, SLP_FUNGIBLE, SLP_NFT1_CHILD,
    SLP_NFT1_GROUP, SLP_SEND_MAX_OUTPUTS,
};
use crate::token_ledger::TokenInputInfo;
use crate::tx::TargetOutput;
use crate::utxo::Utxo;

/// The only mint baton output index this wallet creates
pub const MINT_BATON_VOUT: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutputError {
    Slp(SlpError),
    Token(TokenError),
    /// Genesis asked for a baton somewhere other than output 2
    UnsupportedMintBatonVout(u8),
    /// MINT is only built for fungible and NFT1 parent tokens
    UnsupportedMintType(u8),
    NoFanInputs,
}

impl fmt::Display for TokenOutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slp(e) => write!(f, "{}", e),
            Self::Token(e) => write!(f, "{}", e),
            Self::UnsupportedMintBatonVout(vout) => write!(
                f,
                "Only fixed supply tokens or tokens with a mint baton at output {} are supported, got {}",
                MINT_BATON_VOUT, vout
            ),
            Self::UnsupportedMintType(token_type) => {
                write!(f, "Cannot mint token type 0x{:02x}", token_type)
            }
            Self::NoFanInputs => write!(f, "No eligible inputs for this NFT parent fan tx"),
        }
    }
}

impl std::error::Error for TokenOutputError {}

impl From<SlpError> for TokenOutputError {
    fn from(e: SlpError) -> Self {
        Self::Slp(e)
    }
}

impl From<TokenError> for TokenOutputError {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

fn check_genesis_baton(mint_baton_vout: Option<u8>) -> Result<(), TokenOutputError> {
    match mint_baton_vout {
        None | Some(MINT_BATON_VOUT) => Ok(()),
        Some(vout) => Err(TokenOutputError::UnsupportedMintBatonVout(vout)),
    }
}

fn genesis_outputs(
    token_type: u8,
    info: &GenesisInfo,
    initial_atoms: u64,
    mint_baton_vout: Option<u8>,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    check_genesis_baton(mint_baton_vout)?;
    let script = slp_genesis(token_type, info, initial_atoms, mint_baton_vout)?;

    let mut outputs = vec![
        TargetOutput::op_return(script),
        TargetOutput::token_dust_change(),
    ];
    if mint_baton_vout.is_some() {
        outputs.push(TargetOutput::token_dust_change());
    }
    Ok(outputs)
}

/// Fungible token genesis: supply at output 1, optional baton at output 2
pub fn get_slp_genesis_target_outputs(
    info: &GenesisInfo,
    initial_atoms: u64,
    mint_baton_vout: Option<u8>,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    genesis_outputs(SLP_FUNGIBLE, info, initial_atoms, mint_baton_vout)
}

/// NFT1 parent (collection) genesis
pub fn get_nft_parent_genesis_target_outputs(
    info: &GenesisInfo,
    initial_atoms: u64,
    mint_baton_vout: Option<u8>,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    genesis_outputs(SLP_NFT1_GROUP, info, initial_atoms, mint_baton_vout)
}

/// SEND to `destination` at output 1, token change (if any) at output 2
pub fn get_slp_send_target_outputs(
    info: &TokenInputInfo,
    destination: Script,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    let script = slp_send(&info.token_id, SLP_FUNGIBLE, &info.send_amounts)?;

    let mut outputs = vec![
        TargetOutput::op_return(script),
        TargetOutput::new(DUST_SATS, destination),
    ];
    if info.send_amounts.len() > 1 {
        outputs.push(TargetOutput::token_dust_change());
    }
    Ok(outputs)
}

/// Burn everything but the change from `info`.
///
/// A burn is a SEND with no destination. Output 1 always exists and holds
/// the change, which may be 0.
pub fn get_slp_burn_target_outputs(
    info: &TokenInputInfo,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    let script = slp_send(&info.token_id, SLP_FUNGIBLE, &[info.change()])?;
    Ok(vec![
        TargetOutput::op_return(script),
        TargetOutput::token_dust_change(),
    ])
}

/// MINT `mint_qty` (decimalized) to output 1, keeping the baton at output 2
pub fn get_mint_target_outputs(
    token_id: &TokenId,
    decimals: SlpDecimals,
    mint_qty: &str,
    token_type: u8,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    if token_type != SLP_FUNGIBLE && token_type != SLP_NFT1_GROUP {
        return Err(TokenOutputError::UnsupportedMintType(token_type));
    }
    let atoms = undecimalize_token_amount(mint_qty, decimals)?;
    let atoms = u64::try_from(atoms).map_err(|_| TokenError::InvalidAmount {
        message: format!("{mint_qty} exceeds the largest quantity one SLP output can carry"),
    })?;
    mint_outputs(token_id, token_type, atoms)
}

/// NFT1 parent MINT. Parents always have 0 decimals.
pub fn get_nft_parent_mint_target_outputs(
    token_id: &TokenId,
    mint_atoms: u64,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    mint_outputs(token_id, SLP_NFT1_GROUP, mint_atoms)
}

fn mint_outputs(
    token_id: &TokenId,
    token_type: u8,
    atoms: u64,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    let script = slp_mint(token_id, token_type, atoms, Some(MINT_BATON_VOUT))?;
    Ok(vec![
        TargetOutput::op_return(script),
        TargetOutput::token_dust_change(),
        TargetOutput::token_dust_change(),
    ])
}

/// An NFT1 parent fan-out: split parent tokens into qty-1 outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftParentFanTx {
    /// Inputs actually consumed, a prefix of the eligible inputs
    pub inputs: Vec<Utxo>,
    pub target_outputs: Vec<TargetOutput>,
}

/// Build a fan-out creating as many qty-1 parent outputs as one SEND allows.
///
/// With 19 or more parent tokens available the tx has 18 qty-1 outputs plus
/// one change output. With fewer, every token gets its own output.
pub fn get_nft_parent_fan_tx_target_outputs(
    fan_inputs: &[Utxo],
) -> Result<NftParentFanTx, TokenOutputError> {
    let token_id = fan_inputs
        .first()
        .and_then(|utxo| utxo.token.as_ref())
        .map(|token| token.token_id.clone())
        .ok_or(TokenOutputError::NoFanInputs)?;

    let max_outputs = SLP_SEND_MAX_OUTPUTS as u128;
    let mut inputs = Vec::new();
    let mut total: u128 = 0;
    for utxo in fan_inputs {
        inputs.push(utxo.clone());
        total += utxo.token.as_ref().map_or(0, |t| u128::from(t.atoms));
        if total >= max_outputs {
            break;
        }
    }

    let fan_outputs = if total >= max_outputs {
        SLP_SEND_MAX_OUTPUTS
    } else {
        total as usize
    };

    let send_amounts = if total >= max_outputs {
        let change = total - (max_outputs - 1);
        let change = u64::try_from(change).map_err(|_| TokenError::InvalidAmount {
            message: "NFT parent fan change overflows an SLP output".to_string(),
        })?;
        let mut amounts = vec![1u64; SLP_SEND_MAX_OUTPUTS - 1];
        amounts.push(change);
        amounts
    } else {
        vec![1u64; fan_outputs]
    };

    let script = slp_send(&token_id, SLP_NFT1_GROUP, &send_amounts)?;

    let mut target_outputs = Vec::with_capacity(fan_outputs + 1);
    target_outputs.push(TargetOutput::op_return(script));
    target_outputs.extend((0..fan_outputs).map(|_| TargetOutput::token_dust_change()));

    Ok(NftParentFanTx {
        inputs,
        target_outputs,
    })
}

/// Mint a single NFT1 child to output 1.
///
/// The parent is implied by the qty-1 parent input the caller spends.
pub fn get_nft_child_genesis_target_outputs(
    info: &GenesisInfo,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    let script = slp_genesis(SLP_NFT1_CHILD, info, 1, None)?;
    Ok(vec![
        TargetOutput::op_return(script),
        TargetOutput::token_dust_change(),
    ])
}

/// Send one NFT1 child to `destination`
pub fn get_nft_child_send_target_outputs(
    token_id: &TokenId,
    destination: Script,
) -> Result<Vec<TargetOutput>, TokenOutputError> {
    let script = slp_send(token_id, SLP_NFT1_CHILD, &[1])?;
    Ok(vec![
        TargetOutput::op_return(script),
        TargetOutput::new(DUST_SATS, destination),
    ])
}

/// True for an output the builder must pay to the wallet's change script
pub fn is_token_dust_change_output(output: &TargetOutput) -> bool {
    output.script.is_none() && output.sats == DUST_SATS
}
