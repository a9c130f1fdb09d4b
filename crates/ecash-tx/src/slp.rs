//! SLP v1 OP_RETURN encoding and parsing
//!
//! Every SLP script has the same prefix:
//! ```text
//! 0x6a                      -- OP_RETURN
//! 04 534c5000               -- LOKAD ID "SLP\0"
//! 01 <token type>           -- 0x01 fungible, 0x41 NFT1 child, 0x81 NFT1 group
//! <push action>             -- "GENESIS" | "MINT" | "SEND"
//! ```
//! followed by action specific pushes. Quantities are always 8-byte big-endian.

use ecash_core::TokenId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::script::{push_bytes, Op, Script, ScriptError, ScriptReader, OP_RETURN};

pub const SLP_LOKAD_ID: [u8; 4] = *b"SLP\0";

pub const SLP_FUNGIBLE: u8 = 0x01;
pub const SLP_MINT_VAULT: u8 = 0x02;
pub const SLP_NFT1_CHILD: u8 = 0x41;
pub const SLP_NFT1_GROUP: u8 = 0x81;

pub const ACTION_GENESIS: &[u8] = b"GENESIS";
pub const ACTION_MINT: &[u8] = b"MINT";
pub const ACTION_SEND: &[u8] = b"SEND";

/// A SEND may carry at most 19 amounts: each costs 9 bytes and the full
/// script must stay under the 223-byte OP_RETURN limit.
pub const SLP_SEND_MAX_OUTPUTS: usize = 19;

/// Width of every quantity field
pub const SLP_AMOUNT_WIDTH: usize = 8;

const TOKEN_ID_LEN: usize = 32;
const GENESIS_HASH_LEN: usize = 32;
const MAX_DECIMALS: u8 = 9;

/// Token metadata committed in a GENESIS script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisInfo {
    pub token_ticker: String,
    pub token_name: String,
    pub url: String,
    /// Optional 32-byte document hash, hex-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub decimals: u8,
}

/// A decoded SLP script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlpPayload {
    pub token_type: u8,
    pub action: SlpAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlpAction {
    Genesis {
        info: GenesisInfo,
        mint_baton_vout: Option<u8>,
        initial_atoms: u64,
    },
    Mint {
        token_id: TokenId,
        mint_baton_vout: Option<u8>,
        additional_atoms: u64,
    },
    Send {
        token_id: TokenId,
        amounts: Vec<u64>,
    },
}

impl SlpAction {
    pub fn token_id(&self) -> Option<&TokenId> {
        match self {
            SlpAction::Genesis { .. } => None,
            SlpAction::Mint { token_id, .. } | SlpAction::Send { token_id, .. } => Some(token_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlpError {
    #[error("Script does not start with OP_RETURN")]
    NotOpReturn,

    #[error("LOKAD ID {found} is not SLP")]
    WrongLokad { found: String },

    #[error("Token type push must be 1 byte, got {len}")]
    InvalidTokenTypeLength { len: usize },

    #[error("Unsupported SLP token type 0x{0:02x}")]
    UnsupportedTokenType(u8),

    #[error("Unknown SLP action {found}")]
    UnknownAction { found: String },

    #[error("Action {action} is not valid for token type 0x{token_type:02x}")]
    ActionNotAllowed { action: &'static str, token_type: u8 },

    #[error("Token ID must be 32 bytes, got {found}")]
    InvalidTokenIdLength { found: usize },

    #[error("Invalid token ID: {0}")]
    InvalidTokenId(String),

    #[error("Amount field must be 8 bytes, got {found}")]
    InvalidAmountLength { found: usize },

    #[error("SEND must have between 1 and 19 amounts, got {count}")]
    InvalidAmountCount { count: usize },

    #[error("Mint baton vout must be empty or a single byte >= 2, got {0:?}")]
    InvalidMintBatonVout(Vec<u8>),

    #[error("Genesis hash must be empty or 32 bytes, got {found}")]
    InvalidGenesisHash { found: usize },

    #[error("Decimals must be a single byte 0-9, got {0:?}")]
    InvalidDecimals(Vec<u8>),

    #[error("NFT1 child genesis must mint exactly 1 with 0 decimals and no baton")]
    InvalidNftChildGenesis,

    #[error("Unexpected data after SLP payload")]
    TrailingData,

    #[error("Malformed script: {0}")]
    Script(#[from] ScriptError),
}

fn is_supported_token_type(token_type: u8) -> bool {
    matches!(token_type, SLP_FUNGIBLE | SLP_NFT1_CHILD | SLP_NFT1_GROUP)
}

fn slp_prefix(token_type: u8, action: &[u8]) -> Result<Vec<u8>, SlpError> {
    if !is_supported_token_type(token_type) {
        return Err(SlpError::UnsupportedTokenType(token_type));
    }
    let mut bytes = vec![OP_RETURN];
    push_bytes(&mut bytes, &SLP_LOKAD_ID);
    push_bytes(&mut bytes, &[token_type]);
    push_bytes(&mut bytes, action);
    Ok(bytes)
}

fn token_id_bytes(token_id: &TokenId) -> Result<[u8; 32], SlpError> {
    token_id
        .to_bytes()
        .ok_or_else(|| SlpError::InvalidTokenId(token_id.to_string()))
}

fn push_mint_baton_vout(bytes: &mut Vec<u8>, vout: Option<u8>) -> Result<(), SlpError> {
    match vout {
        None => push_bytes(bytes, &[]),
        Some(v) if v >= 2 => push_bytes(bytes, &[v]),
        Some(v) => return Err(SlpError::InvalidMintBatonVout(vec![v])),
    }
    Ok(())
}

// =============================================================================
// Builders
// =============================================================================

/// Build an SLP SEND script moving `amounts[i]` atoms to output `i + 1`.
pub fn slp_send(token_id: &TokenId, token_type: u8, amounts: &[u64]) -> Result<Script, SlpError> {
    if amounts.is_empty() || amounts.len() > SLP_SEND_MAX_OUTPUTS {
        return Err(SlpError::InvalidAmountCount {
            count: amounts.len(),
        });
    }
    let token_id = token_id_bytes(token_id)?;

    let mut bytes = slp_prefix(token_type, ACTION_SEND)?;
    push_bytes(&mut bytes, &token_id);
    for amount in amounts {
        push_bytes(&mut bytes, &amount.to_be_bytes());
    }
    Ok(Script(bytes))
}

/// Build an SLP MINT script. Minted atoms go to output 1.
pub fn slp_mint(
    token_id: &TokenId,
    token_type: u8,
    additional_atoms: u64,
    mint_baton_vout: Option<u8>,
) -> Result<Script, SlpError> {
    if token_type == SLP_NFT1_CHILD {
        return Err(SlpError::ActionNotAllowed {
            action: "MINT",
            token_type,
        });
    }
    let token_id = token_id_bytes(token_id)?;

    let mut bytes = slp_prefix(token_type, ACTION_MINT)?;
    push_bytes(&mut bytes, &token_id);
    push_mint_baton_vout(&mut bytes, mint_baton_vout)?;
    push_bytes(&mut bytes, &additional_atoms.to_be_bytes());
    Ok(Script(bytes))
}

/// Build an SLP GENESIS script. Initial atoms go to output 1.
pub fn slp_genesis(
    token_type: u8,
    info: &GenesisInfo,
    initial_atoms: u64,
    mint_baton_vout: Option<u8>,
) -> Result<Script, SlpError> {
    if info.decimals > MAX_DECIMALS {
        return Err(SlpError::InvalidDecimals(vec![info.decimals]));
    }
    if token_type == SLP_NFT1_CHILD
        && (info.decimals != 0 || mint_baton_vout.is_some() || initial_atoms != 1)
    {
        return Err(SlpError::InvalidNftChildGenesis);
    }
    let hash = match &info.hash {
        None => Vec::new(),
        Some(hash_hex) => {
            let hash = hex::decode(hash_hex).map_err(|_| SlpError::Script(ScriptError::InvalidHex))?;
            if hash.len() != GENESIS_HASH_LEN {
                return Err(SlpError::InvalidGenesisHash { found: hash.len() });
            }
            hash
        }
    };

    let mut bytes = slp_prefix(token_type, ACTION_GENESIS)?;
    push_bytes(&mut bytes, info.token_ticker.as_bytes());
    push_bytes(&mut bytes, info.token_name.as_bytes());
    push_bytes(&mut bytes, info.url.as_bytes());
    push_bytes(&mut bytes, &hash);
    push_bytes(&mut bytes, &[info.decimals]);
    push_mint_baton_vout(&mut bytes, mint_baton_vout)?;
    push_bytes(&mut bytes, &initial_atoms.to_be_bytes());
    Ok(Script(bytes))
}

// =============================================================================
// Parser
// =============================================================================

/// Parse an SLP OP_RETURN script.
///
/// Checks run in wire order (OP_RETURN, LOKAD, token type, action, then the
/// action fields), so the error names the first field that is wrong.
pub fn parse_slp(script: &[u8]) -> Result<SlpPayload, SlpError> {
    let mut reader = ScriptReader::new(script);

    match reader.read_op()? {
        Some(Op::Code(OP_RETURN)) => {}
        _ => return Err(SlpError::NotOpReturn),
    }

    let lokad = reader.read_push()?;
    if lokad != SLP_LOKAD_ID {
        return Err(SlpError::WrongLokad {
            found: hex::encode(lokad),
        });
    }

    let token_type = match reader.read_push()? {
        [token_type] => *token_type,
        other => return Err(SlpError::InvalidTokenTypeLength { len: other.len() }),
    };
    if !is_supported_token_type(token_type) {
        return Err(SlpError::UnsupportedTokenType(token_type));
    }

    let action = match reader.read_push()? {
        ACTION_SEND => parse_send(&mut reader)?,
        ACTION_MINT => {
            if token_type == SLP_NFT1_CHILD {
                return Err(SlpError::ActionNotAllowed {
                    action: "MINT",
                    token_type,
                });
            }
            parse_mint(&mut reader)?
        }
        ACTION_GENESIS => parse_genesis(&mut reader, token_type)?,
        other => {
            return Err(SlpError::UnknownAction {
                found: hex::encode(other),
            })
        }
    };

    Ok(SlpPayload { token_type, action })
}

fn read_token_id(reader: &mut ScriptReader<'_>) -> Result<TokenId, SlpError> {
    let data = reader.read_push()?;
    let bytes: &[u8; TOKEN_ID_LEN] = data
        .try_into()
        .map_err(|_| SlpError::InvalidTokenIdLength { found: data.len() })?;
    Ok(TokenId::from_bytes(bytes))
}

fn read_amount(reader: &mut ScriptReader<'_>) -> Result<u64, SlpError> {
    let data = reader.read_push()?;
    let bytes: [u8; SLP_AMOUNT_WIDTH] = data
        .try_into()
        .map_err(|_| SlpError::InvalidAmountLength { found: data.len() })?;
    Ok(u64::from_be_bytes(bytes))
}

fn read_mint_baton_vout(reader: &mut ScriptReader<'_>) -> Result<Option<u8>, SlpError> {
    match reader.read_push()? {
        [] => Ok(None),
        [vout] if *vout >= 2 => Ok(Some(*vout)),
        other => Err(SlpError::InvalidMintBatonVout(other.to_vec())),
    }
}

fn expect_end(reader: &ScriptReader<'_>) -> Result<(), SlpError> {
    if reader.is_finished() {
        Ok(())
    } else {
        Err(SlpError::TrailingData)
    }
}

fn parse_send(reader: &mut ScriptReader<'_>) -> Result<SlpAction, SlpError> {
    let token_id = read_token_id(reader)?;
    let mut amounts = Vec::new();
    while !reader.is_finished() {
        amounts.push(read_amount(reader)?);
    }
    if amounts.is_empty() || amounts.len() > SLP_SEND_MAX_OUTPUTS {
        return Err(SlpError::InvalidAmountCount {
            count: amounts.len(),
        });
    }
    Ok(SlpAction::Send { token_id, amounts })
}

fn parse_mint(reader: &mut ScriptReader<'_>) -> Result<SlpAction, SlpError> {
    let token_id = read_token_id(reader)?;
    let mint_baton_vout = read_mint_baton_vout(reader)?;
    let additional_atoms = read_amount(reader)?;
    expect_end(reader)?;
    Ok(SlpAction::Mint {
        token_id,
        mint_baton_vout,
        additional_atoms,
    })
}

fn parse_genesis(reader: &mut ScriptReader<'_>, token_type: u8) -> Result<SlpAction, SlpError> {
    let token_ticker = String::from_utf8_lossy(reader.read_push()?).into_owned();
    let token_name = String::from_utf8_lossy(reader.read_push()?).into_owned();
    let url = String::from_utf8_lossy(reader.read_push()?).into_owned();

    let hash = match reader.read_push()? {
        [] => None,
        hash if hash.len() == GENESIS_HASH_LEN => Some(hex::encode(hash)),
        hash => return Err(SlpError::InvalidGenesisHash { found: hash.len() }),
    };

    let decimals = match reader.read_push()? {
        [decimals] if *decimals <= MAX_DECIMALS => *decimals,
        other => return Err(SlpError::InvalidDecimals(other.to_vec())),
    };

    let mint_baton_vout = read_mint_baton_vout(reader)?;
    let initial_atoms = read_amount(reader)?;
    expect_end(reader)?;

    if token_type == SLP_NFT1_CHILD
        && (decimals != 0 || mint_baton_vout.is_some() || initial_atoms != 1)
    {
        return Err(SlpError::InvalidNftChildGenesis);
    }

    Ok(SlpAction::Genesis {
        info: GenesisInfo {
            token_ticker,
            token_name,
            url,
            hash,
            decimals,
        },
        mint_baton_vout,
        initial_atoms,
    })
}
