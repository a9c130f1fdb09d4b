//! Decimalized token balances

use std::collections::HashMap;

use ecash_core::{IndexerError, TokenId};
use ecash_tx::{decimalize_token_amount, SlpDecimals, Utxo};

use crate::indexer::ChronikIndexer;
use crate::token_cache::TokenCache;

/// Balance of every token in `token_utxos`, decimalized.
///
/// Uncached tokens are looked up once and added to `cache`. Mint batons
/// hold no atoms but still give their token an entry.
pub async fn get_token_balances<C: ChronikIndexer + ?Sized>(
    indexer: &C,
    token_utxos: &[Utxo],
    cache: &mut TokenCache,
) -> Result<HashMap<TokenId, String>, IndexerError> {
    let mut atoms: HashMap<TokenId, u128> = HashMap::new();
    for token in token_utxos.iter().filter_map(|utxo| utxo.token.as_ref()) {
        *atoms.entry(token.token_id.clone()).or_insert(0) += u128::from(token.atoms);
    }

    let mut balances = HashMap::with_capacity(atoms.len());
    for (token_id, total) in atoms {
        if !cache.contains(&token_id) {
            tracing::debug!(token_id = %token_id, "Caching token info");
            let info = indexer.token_info(&token_id).await?;
            cache.insert(info);
        }
        let decimals = cache
            .get(&token_id)
            .map(|info| info.genesis_info.decimals)
            .ok_or_else(|| IndexerError::TokenNotFound {
                token_id: token_id.to_string(),
            })?;
        let decimals = SlpDecimals::new(decimals).map_err(|e| IndexerError::ParseError(e.to_string()))?;
        balances.insert(token_id, decimalize_token_amount(total, decimals));
    }

    Ok(balances)
}
