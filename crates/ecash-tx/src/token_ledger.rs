//! Token utxo lookup and token input selection
//!
//! Every lookup compares token IDs as-is. A malformed or unknown token ID
//! matches nothing and yields an empty result rather than an error.

use ecash_core::{TokenError, TokenId};

use crate::amounts::{decimalize_token_amount, undecimalize_token_amount, SlpDecimals};
use crate::utxo::Utxo;

/// Quantity of NFT1 parent that a child genesis must burn
pub const SLP1_NFT_CHILD_GENESIS_AMOUNT: u64 = 1;

/// Mint batons for `token_id`, in input order.
pub fn get_mint_batons(utxos: &[Utxo], token_id: &TokenId) -> Vec<Utxo> {
    utxos
        .iter()
        .filter(|utxo| matches!(&utxo.token, Some(t) if &t.token_id == token_id && t.is_mint_baton))
        .cloned()
        .collect()
}

/// Every non-baton utxo of `token_id`, in input order.
pub fn get_all_send_utxos(utxos: &[Utxo], token_id: &TokenId) -> Vec<Utxo> {
    utxos
        .iter()
        .filter(|utxo| matches!(&utxo.token, Some(t) if &t.token_id == token_id && !t.is_mint_baton))
        .cloned()
        .collect()
}

/// Inputs and SEND amounts for a token spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInputInfo {
    pub token_inputs: Vec<Utxo>,
    /// `[send_qty]` or `[send_qty, change]`; change is omitted when zero
    pub send_amounts: Vec<u64>,
    pub token_id: TokenId,
}

impl TokenInputInfo {
    pub fn change(&self) -> u64 {
        self.send_amounts.get(1).copied().unwrap_or(0)
    }
}

/// Pick token inputs covering the decimalized `send_qty`.
///
/// Inputs are taken in utxo order until the running total reaches the
/// requested quantity.
pub fn get_send_token_inputs(
    utxos: &[Utxo],
    token_id: &TokenId,
    send_qty: &str,
    decimals: SlpDecimals,
) -> Result<TokenInputInfo, TokenError> {
    if send_qty.is_empty() {
        return Err(TokenError::InvalidAmount {
            message: "sendQty must be a decimalized number, got an empty string".to_string(),
        });
    }

    let send_utxos = get_all_send_utxos(utxos, token_id);
    if send_utxos.is_empty() {
        return Err(TokenError::NoTokenUtxos {
            token_id: token_id.to_string(),
        });
    }

    let required = undecimalize_token_amount(send_qty, decimals)?;
    let send_atoms = u64::try_from(required).map_err(|_| TokenError::InvalidAmount {
        message: format!("{send_qty} exceeds the largest quantity one SLP output can carry"),
    })?;

    let mut total: u128 = 0;
    let mut token_inputs = Vec::new();
    for utxo in send_utxos {
        total += utxo.token.as_ref().map_or(0, |t| u128::from(t.atoms));
        token_inputs.push(utxo);
        if total >= required {
            break;
        }
    }

    if total < required {
        return Err(TokenError::InsufficientTokens {
            token: token_id.to_string(),
            required: decimalize_token_amount(required, decimals),
            available: decimalize_token_amount(total, decimals),
        });
    }

    let mut send_amounts = vec![send_atoms];
    // The last input alone pushed the total past `required`, so change fits in u64
    let change = u64::try_from(total - required).map_err(|_| TokenError::InvalidAmount {
        message: format!("token change for {send_qty} overflows an SLP output"),
    })?;
    if change > 0 {
        send_amounts.push(change);
    }

    Ok(TokenInputInfo {
        token_inputs,
        send_amounts,
        token_id: token_id.clone(),
    })
}

/// NFT1 parent utxos worth splitting into qty-1 outputs.
///
/// Excludes mint batons and utxos already holding exactly 1.
pub fn get_nft_parent_fan_inputs(token_id: &TokenId, utxos: &[Utxo]) -> Vec<Utxo> {
    utxos
        .iter()
        .filter(|utxo| {
            matches!(&utxo.token, Some(t) if &t.token_id == token_id
                && !t.is_mint_baton
                && t.atoms != SLP1_NFT_CHILD_GENESIS_AMOUNT)
        })
        .cloned()
        .collect()
}

/// First NFT1 parent utxo holding exactly 1, the input a child genesis burns.
pub fn get_nft_child_genesis_input(token_id: &TokenId, utxos: &[Utxo]) -> Option<Utxo> {
    utxos
        .iter()
        .find(|utxo| {
            matches!(&utxo.token, Some(t) if &t.token_id == token_id
                && !t.is_mint_baton
                && t.atoms == SLP1_NFT_CHILD_GENESIS_AMOUNT)
        })
        .cloned()
}

/// The utxo holding NFT `token_id`, if the wallet has it.
///
/// An NFT1 child exists in exactly one utxo, so the first match is returned.
pub fn get_nft(token_id: &TokenId, utxos: &[Utxo]) -> Option<Utxo> {
    utxos.iter().find(|utxo| utxo.holds_token(token_id)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::tests::{mock_mint_baton, mock_token_utxo, mock_utxo, TOKEN_A, TOKEN_B};

    fn token_a() -> TokenId {
        TokenId::new(TOKEN_A)
    }

    fn decimals(d: u8) -> SlpDecimals {
        SlpDecimals::new(d).unwrap()
    }

    #[test]
    fn test_get_mint_batons_filters_by_token_and_flag() {
        let utxos = vec![
            mock_utxo(1, 10_000),
            mock_mint_baton(2, TOKEN_A),
            mock_token_utxo(3, TOKEN_A, 100),
            mock_mint_baton(4, TOKEN_B),
            mock_mint_baton(5, TOKEN_A),
        ];
        assert_eq!(
            get_mint_batons(&utxos, &token_a()),
            vec![utxos[1].clone(), utxos[4].clone()]
        );
        assert_eq!(
            get_mint_batons(&utxos, &TokenId::new(TOKEN_B)),
            vec![utxos[3].clone()]
        );
    }

    #[test]
    fn test_get_mint_batons_unknown_or_malformed_token() {
        let utxos = vec![mock_mint_baton(1, TOKEN_A)];
        assert!(get_mint_batons(&utxos, &TokenId::new("cc".repeat(32))).is_empty());
        assert!(get_mint_batons(&utxos, &TokenId::new("not a token id")).is_empty());
        assert!(get_mint_batons(&[], &token_a()).is_empty());
    }

    #[test]
    fn test_get_all_send_utxos_excludes_batons() {
        let utxos = vec![
            mock_token_utxo(1, TOKEN_A, 5),
            mock_mint_baton(2, TOKEN_A),
            mock_token_utxo(3, TOKEN_B, 5),
            mock_token_utxo(4, TOKEN_A, 7),
        ];
        assert_eq!(
            get_all_send_utxos(&utxos, &token_a()),
            vec![utxos[0].clone(), utxos[3].clone()]
        );
    }

    #[test]
    fn test_send_inputs_exact_amount_has_no_change() {
        let utxos = vec![mock_token_utxo(1, TOKEN_A, 100), mock_token_utxo(2, TOKEN_A, 50)];
        let info = get_send_token_inputs(&utxos, &token_a(), "1.00", decimals(2)).unwrap();
        assert_eq!(info.token_inputs, vec![utxos[0].clone()]);
        assert_eq!(info.send_amounts, vec![100]);
        assert_eq!(info.change(), 0);
    }

    #[test]
    fn test_send_inputs_with_change() {
        let utxos = vec![
            mock_token_utxo(1, TOKEN_A, 100),
            mock_mint_baton(2, TOKEN_A),
            mock_token_utxo(3, TOKEN_A, 50),
        ];
        let info = get_send_token_inputs(&utxos, &token_a(), "120", decimals(0)).unwrap();
        assert_eq!(info.token_inputs, vec![utxos[0].clone(), utxos[2].clone()]);
        assert_eq!(info.send_amounts, vec![120, 30]);
        assert_eq!(info.token_id, token_a());
    }

    #[test]
    fn test_send_inputs_insufficient_reports_decimalized_amounts() {
        let utxos = vec![mock_token_utxo(1, TOKEN_A, 100)];
        let err = get_send_token_inputs(&utxos, &token_a(), "1.01", decimals(2)).unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientTokens {
                token: TOKEN_A.to_string(),
                required: "1.01".into(),
                available: "1.00".into(),
            }
        );
    }

    #[test]
    fn test_send_inputs_errors() {
        let utxos = vec![mock_token_utxo(1, TOKEN_A, 100)];
        assert_eq!(
            get_send_token_inputs(&utxos, &token_a(), "", decimals(0))
                .unwrap_err()
                .error_code(),
            "invalid_amount"
        );
        assert_eq!(
            get_send_token_inputs(&utxos, &TokenId::new(TOKEN_B), "1", decimals(0)),
            Err(TokenError::NoTokenUtxos {
                token_id: TOKEN_B.to_string()
            })
        );
        assert!(get_send_token_inputs(&utxos, &token_a(), "1.234", decimals(2)).is_err());
    }

    #[test]
    fn test_nft_parent_fan_inputs() {
        let utxos = vec![
            mock_token_utxo(1, TOKEN_A, 1),
            mock_token_utxo(2, TOKEN_A, 20),
            mock_mint_baton(3, TOKEN_A),
            mock_token_utxo(4, TOKEN_B, 20),
        ];
        assert_eq!(
            get_nft_parent_fan_inputs(&token_a(), &utxos),
            vec![utxos[1].clone()]
        );
    }

    #[test]
    fn test_nft_child_genesis_input_requires_qty_one() {
        let utxos = vec![
            mock_token_utxo(1, TOKEN_A, 20),
            mock_token_utxo(2, TOKEN_A, 1),
            mock_token_utxo(3, TOKEN_A, 1),
        ];
        assert_eq!(
            get_nft_child_genesis_input(&token_a(), &utxos),
            Some(utxos[1].clone())
        );
        assert_eq!(get_nft_child_genesis_input(&token_a(), &utxos[..1]), None);
    }

    #[test]
    fn test_get_nft() {
        let utxos = vec![mock_utxo(1, 1_000), mock_token_utxo(2, TOKEN_B, 1)];
        assert_eq!(
            get_nft(&TokenId::new(TOKEN_B), &utxos),
            Some(utxos[1].clone())
        );
        assert_eq!(get_nft(&token_a(), &utxos), None);
    }
}
