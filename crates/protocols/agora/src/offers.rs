//! Offer validation and bucketing
//!
//! Offers are public chain data, so a malformed one is noise rather than an
//! error: it is dropped with a debug log and never reaches either map.

use std::fmt;

use ecash_core::{PublicKey, TokenId};
use ecash_tx::script::{Op, ScriptError, ScriptReader, OP_RETURN};
use ecash_tx::slp::{ACTION_SEND, SLP_AMOUNT_WIDTH, SLP_LOKAD_ID, SLP_NFT1_CHILD};

use crate::constants::{ONESHOT_ENFORCED_OUTPUTS, ONESHOT_SEND_AMOUNTS};
use crate::state::{AgoraError, Listing, ParsedAgoraTx, TokenOfferMaps};

/// Why an offer was left out of the maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferRejection {
    Spent,
    WrongOutputCount(usize),
    /// The OP_RETURN output carries sats, which would be burned
    BurnsSats(u64),
    NotOpReturn,
    WrongLokad(Vec<u8>),
    WrongTokenType(Vec<u8>),
    WrongAction(Vec<u8>),
    BadTokenIdLength(usize),
    WrongAmounts,
    Malformed(ScriptError),
}

impl fmt::Display for OfferRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spent => write!(f, "offer already spent"),
            Self::WrongOutputCount(n) => write!(f, "expected 2 enforced outputs, got {}", n),
            Self::BurnsSats(sats) => write!(f, "OP_RETURN output carries {} sats", sats),
            Self::NotOpReturn => write!(f, "first enforced output is not OP_RETURN"),
            Self::WrongLokad(lokad) => write!(f, "LOKAD {} is not SLP", hex::encode(lokad)),
            Self::WrongTokenType(t) => write!(f, "token type {} is not NFT1 child", hex::encode(t)),
            Self::WrongAction(a) => write!(f, "action {} is not SEND", hex::encode(a)),
            Self::BadTokenIdLength(len) => write!(f, "token ID is {} bytes", len),
            Self::WrongAmounts => write!(f, "SEND amounts are not [0, 1]"),
            Self::Malformed(e) => write!(f, "malformed script: {}", e),
        }
    }
}

impl From<ScriptError> for OfferRejection {
    fn from(e: ScriptError) -> Self {
        Self::Malformed(e)
    }
}

/// Check that `tx` is an open single-NFT sale and return the offered token.
///
/// Checks run in a fixed order and stop at the first failure.
pub fn validate_offer(tx: &ParsedAgoraTx) -> Result<TokenId, OfferRejection> {
    if tx.spent_by.is_some() {
        return Err(OfferRejection::Spent);
    }

    let outputs = &tx.params.enforced_outputs;
    if outputs.len() != ONESHOT_ENFORCED_OUTPUTS {
        return Err(OfferRejection::WrongOutputCount(outputs.len()));
    }

    let op_return = &outputs[0];
    if op_return.sats != 0 {
        return Err(OfferRejection::BurnsSats(op_return.sats));
    }

    let mut reader = ScriptReader::new(op_return.script.bytes());
    match reader.read_op()? {
        Some(Op::Code(OP_RETURN)) => {}
        _ => return Err(OfferRejection::NotOpReturn),
    }

    let lokad = reader.read_push()?;
    if lokad != SLP_LOKAD_ID {
        return Err(OfferRejection::WrongLokad(lokad.to_vec()));
    }

    let token_type = reader.read_push()?;
    if token_type != [SLP_NFT1_CHILD] {
        return Err(OfferRejection::WrongTokenType(token_type.to_vec()));
    }

    let action = reader.read_push()?;
    if action != ACTION_SEND {
        return Err(OfferRejection::WrongAction(action.to_vec()));
    }

    let token_id = reader.read_push()?;
    let token_id: &[u8; 32] = token_id
        .try_into()
        .map_err(|_| OfferRejection::BadTokenIdLength(token_id.len()))?;

    let mut amounts = Vec::with_capacity(ONESHOT_SEND_AMOUNTS.len());
    while !reader.is_finished() {
        let amount = reader.read_push()?;
        let amount: [u8; SLP_AMOUNT_WIDTH] =
            amount.try_into().map_err(|_| OfferRejection::WrongAmounts)?;
        amounts.push(u64::from_be_bytes(amount));
    }
    if amounts != ONESHOT_SEND_AMOUNTS {
        return Err(OfferRejection::WrongAmounts);
    }

    Ok(TokenId::from_bytes(token_id))
}

/// Sort valid open offers into the wallet's own listings and everyone else's.
///
/// `None` entries (offers that failed upstream parsing) are skipped. A later
/// valid offer for the same token replaces an earlier one in its map.
pub fn get_token_offer_maps(
    parsed_agora_txs: &[Option<ParsedAgoraTx>],
    my_public_key: Option<&PublicKey>,
) -> Result<TokenOfferMaps, AgoraError> {
    let my_public_key = my_public_key.ok_or(AgoraError::MissingPublicKey)?;

    let mut maps = TokenOfferMaps::default();
    for tx in parsed_agora_txs.iter().flatten() {
        let token_id = match validate_offer(tx) {
            Ok(token_id) => token_id,
            Err(reason) => {
                tracing::debug!(
                    outpoint = %tx.outpoint,
                    reason = %reason,
                    "Skipping agora offer"
                );
                continue;
            }
        };

        let listing = Listing {
            params: tx.params.clone(),
            tx_builder_input: tx.tx_builder_input.clone(),
        };
        let map = if &tx.params.cancel_pk == my_public_key {
            &mut maps.my_listings
        } else {
            &mut maps.offered_listings
        };
        if map.insert(token_id.clone(), listing).is_some() {
            tracing::debug!(token_id = %token_id, "Replacing earlier listing for token");
        }
    }

    Ok(maps)
}
