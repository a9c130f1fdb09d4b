//! Token quantity formatting
//!
//! Token quantities travel in two forms: integer atoms (what scripts and the
//! indexer use) and decimalized strings (what users type and see). All
//! conversion is integer-only so no precision is lost at 9 decimals.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use ecash_core::constants::MAX_OUTPUT_AMOUNT_SLP_ATOMS;
use ecash_core::{TokenError, TokenId};
use serde::{Deserialize, Serialize};

/// Decimal places of an SLP token, always 0-9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlpDecimals(u8);

impl SlpDecimals {
    pub const MAX: u8 = 9;

    pub fn new(decimals: u8) -> Result<Self, TokenError> {
        if decimals > Self::MAX {
            return Err(TokenError::InvalidDecimals { decimals });
        }
        Ok(Self(decimals))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn scale(self) -> u128 {
        10u128.pow(u32::from(self.0))
    }
}

impl TryFrom<u8> for SlpDecimals {
    type Error = TokenError;

    fn try_from(decimals: u8) -> Result<Self, Self::Error> {
        Self::new(decimals)
    }
}

impl From<SlpDecimals> for u8 {
    fn from(decimals: SlpDecimals) -> Self {
        decimals.0
    }
}

impl fmt::Display for SlpDecimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render `atoms` with `decimals` places, e.g. 10012345 at 5 -> "100.12345".
///
/// The fractional part always has exactly `decimals` digits.
pub fn decimalize_token_amount(atoms: u128, decimals: SlpDecimals) -> String {
    if decimals.get() == 0 {
        return atoms.to_string();
    }
    let scale = decimals.scale();
    format!(
        "{}.{:0width$}",
        atoms / scale,
        atoms % scale,
        width = usize::from(decimals.get())
    )
}

/// Parse a user-entered decimal string into atoms.
///
/// Accepts digits with at most one `.`; fewer fractional digits than
/// `decimals` are zero-padded. More fractional digits than `decimals` is an
/// error even if they are zeros.
pub fn undecimalize_token_amount(amount: &str, decimals: SlpDecimals) -> Result<u128, TokenError> {
    let (int_part, frac_part) = split_decimal(amount).ok_or_else(|| TokenError::InvalidAmount {
        message: format!(
            "\"{amount}\" must be a non-empty string of digits with at most one decimal point"
        ),
    })?;

    if frac_part.len() > usize::from(decimals.get()) {
        return Err(TokenError::InvalidAmount {
            message: format!("\"{amount}\" has more precision than {decimals} decimals"),
        });
    }

    let padded = format!(
        "{int_part}{frac_part:0<width$}",
        width = usize::from(decimals.get())
    );
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse::<u128>().map_err(|_| TokenError::InvalidAmount {
        message: format!("\"{amount}\" is too large"),
    })
}

/// Largest decimalized quantity a single SLP output can carry
pub fn get_max_decimalized_slp_qty(decimals: SlpDecimals) -> String {
    decimalize_token_amount(u128::from(MAX_OUTPUT_AMOUNT_SLP_ATOMS), decimals)
}

/// True if `balances` holds at least `required` of `token_id`.
///
/// Both the balance and `required` are decimalized strings. A token missing
/// from `balances` or an unparseable quantity counts as not enough.
pub fn has_enough_token(
    balances: &HashMap<TokenId, String>,
    token_id: &TokenId,
    required: &str,
) -> bool {
    let Some(balance) = balances.get(token_id) else {
        return false;
    };
    matches!(
        compare_decimal_strings(balance, required),
        Some(Ordering::Greater | Ordering::Equal)
    )
}

fn split_decimal(amount: &str) -> Option<(&str, &str)> {
    let (int_part, frac_part) = match amount.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (amount, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    Some((int_part, frac_part))
}

fn compare_decimal_strings(a: &str, b: &str) -> Option<Ordering> {
    let (a_int, a_frac) = split_decimal(a)?;
    let (b_int, b_frac) = split_decimal(b)?;

    let a_int = a_int.trim_start_matches('0');
    let b_int = b_int.trim_start_matches('0');
    let int_order = a_int.len().cmp(&b_int.len()).then_with(|| a_int.cmp(b_int));
    if int_order != Ordering::Equal {
        return Some(int_order);
    }

    let width = a_frac.len().max(b_frac.len());
    let a_frac = format!("{a_frac:0<width$}");
    let b_frac = format!("{b_frac:0<width$}");
    Some(a_frac.cmp(&b_frac))
}
