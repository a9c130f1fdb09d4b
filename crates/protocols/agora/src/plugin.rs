//! Decoding offers from the agora indexer plugin
//!
//! For a oneshot offer the plugin stores:
//! - `data[0]`: hex of the covenant variant, "ONESHOT"
//! - `data[1]`: hex of the serialized enforced outputs after the first
//! - a group `"P" || cancel_pk`, hex-encoded
//!
//! Enforced output 0 is not stored. It is rebuilt from the offered token as
//! an SLP SEND of `[0, atoms]`.
//!
//! Serialized outputs are `value: u64 LE || compact_size(len) || script`.

use std::collections::HashMap;

use ecash_core::{PublicKey, Sats};
use ecash_tx::{slp_send, Script, SignData, TxBuilderInput, TxOutput, Utxo};
use serde::{Deserialize, Serialize};

use crate::constants::{
    AGORA_PLUGIN_NAME, ONESHOT_COVENANT_VARIANT, PARTIAL_COVENANT_VARIANT, PUBKEY_GROUP_PREFIX,
};
use crate::state::{AgoraError, AgoraOneshot, ParsedAgoraTx, SpentBy};

/// Per-utxo data published by the agora plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Hex-encoded group keys
    #[serde(default)]
    pub groups: Vec<String>,
    /// Hex-encoded data fields
    #[serde(default)]
    pub data: Vec<String>,
}

/// An offer utxo together with its plugin data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferUtxo {
    pub utxo: Utxo,
    pub plugin: Option<PluginEntry>,
    pub spent_by: Option<SpentBy>,
}

impl OfferUtxo {
    /// Pair `utxo` with the agora entry of its indexer plugin map, if any
    pub fn from_plugins(
        utxo: Utxo,
        plugins: &HashMap<String, PluginEntry>,
        spent_by: Option<SpentBy>,
    ) -> Self {
        Self {
            utxo,
            plugin: plugins.get(AGORA_PLUGIN_NAME).cloned(),
            spent_by,
        }
    }
}

/// Serialize outputs the way the plugin stores them
pub fn serialize_enforced_outputs(outputs: &[TxOutput]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for output in outputs {
        bytes.extend_from_slice(&output.sats.to_le_bytes());
        write_compact_size(&mut bytes, output.script.len() as u64);
        bytes.extend_from_slice(output.script.bytes());
    }
    bytes
}

/// Read serialized outputs until `bytes` is exhausted
pub fn read_enforced_outputs(bytes: &[u8]) -> Result<Vec<TxOutput>, AgoraError> {
    let mut cursor = Cursor { bytes, idx: 0 };
    let mut outputs = Vec::new();
    while !cursor.is_finished() {
        let sats: Sats = u64::from_le_bytes(cursor.take_array()?);
        let script_len = cursor.read_compact_size()?;
        let script_len = usize::try_from(script_len)
            .map_err(|_| AgoraError::InvalidPluginData(format!("script length {script_len}")))?;
        let script = cursor.take(script_len)?;
        outputs.push(TxOutput::new(sats, Script::new(script)));
    }
    Ok(outputs)
}

/// Rebuild a oneshot offer from its utxo and plugin entry.
///
/// The covenant redeem script is left unset; the signer derives it from
/// `params` when the offer is taken or canceled.
pub fn parse_oneshot_offer(
    utxo: &Utxo,
    plugin: &PluginEntry,
    spent_by: Option<SpentBy>,
) -> Result<ParsedAgoraTx, AgoraError> {
    let variant = decode_field(plugin.data.first(), "covenant variant")?;
    if variant != ONESHOT_COVENANT_VARIANT {
        let name = if variant == PARTIAL_COVENANT_VARIANT {
            "PARTIAL".to_string()
        } else {
            hex::encode(&variant)
        };
        return Err(AgoraError::UnsupportedVariant(name));
    }

    let token = match &utxo.token {
        Some(token) if token.token_type.is_slp() => token,
        _ => return Err(AgoraError::NotSlpToken),
    };

    let mut enforced_outputs = vec![TxOutput::op_return(slp_send(
        &token.token_id,
        token.token_type.number,
        &[0, token.atoms],
    )?)];
    let serialized = decode_field(plugin.data.get(1), "enforced outputs")?;
    enforced_outputs.extend(read_enforced_outputs(&serialized)?);

    let cancel_pk = cancel_pk_from_groups(&plugin.groups).ok_or(AgoraError::MissingCancelPk)?;

    Ok(ParsedAgoraTx {
        params: AgoraOneshot {
            enforced_outputs,
            cancel_pk,
        },
        outpoint: utxo.outpoint.clone(),
        tx_builder_input: TxBuilderInput {
            prev_out: utxo.outpoint.clone(),
            sign_data: SignData {
                sats: utxo.sats,
                redeem_script: None,
            },
        },
        spent_by,
    })
}

/// Parse each offer utxo, mapping failures to `None`
pub fn parse_agora_txs(offers: &[OfferUtxo]) -> Vec<Option<ParsedAgoraTx>> {
    offers
        .iter()
        .map(|offer| {
            let plugin = offer.plugin.as_ref().ok_or(AgoraError::MissingPluginEntry);
            match plugin.and_then(|p| parse_oneshot_offer(&offer.utxo, p, offer.spent_by.clone())) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    tracing::debug!(
                        outpoint = %offer.utxo.outpoint,
                        error = %e,
                        "Skipping unparseable agora utxo"
                    );
                    None
                }
            }
        })
        .collect()
}

fn cancel_pk_from_groups(groups: &[String]) -> Option<PublicKey> {
    groups.iter().find_map(|group| {
        let bytes = hex::decode(group).ok()?;
        let pk = bytes.strip_prefix(PUBKEY_GROUP_PREFIX)?;
        Some(PublicKey::new(pk.to_vec()))
    })
}

fn decode_field(field: Option<&String>, name: &str) -> Result<Vec<u8>, AgoraError> {
    let field = field.ok_or_else(|| AgoraError::InvalidPluginData(format!("missing {name}")))?;
    hex::decode(field).map_err(|e| AgoraError::InvalidPluginData(format!("{name}: {e}")))
}

fn write_compact_size(bytes: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => bytes.push(n as u8),
        0xfd..=0xffff => {
            bytes.push(0xfd);
            bytes.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            bytes.push(0xfe);
            bytes.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            bytes.push(0xff);
            bytes.extend_from_slice(&n.to_le_bytes());
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    idx: usize,
}

impl<'a> Cursor<'a> {
    fn is_finished(&self) -> bool {
        self.idx >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], AgoraError> {
        let end = self
            .idx
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                AgoraError::InvalidPluginData(format!(
                    "need {} bytes at offset {}, have {}",
                    len,
                    self.idx,
                    self.bytes.len() - self.idx
                ))
            })?;
        let data = &self.bytes[self.idx..end];
        self.idx = end;
        Ok(data)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], AgoraError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_compact_size(&mut self) -> Result<u64, AgoraError> {
        let [first] = self.take_array::<1>()?;
        Ok(match first {
            0xfd => u64::from(u16::from_le_bytes(self.take_array()?)),
            0xfe => u64::from(u32::from_le_bytes(self.take_array()?)),
            0xff => u64::from_le_bytes(self.take_array()?),
            n => u64::from(n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::get_token_offer_maps;
    use ecash_core::{Outpoint, TokenId};
    use ecash_tx::{Token, TokenType};

    const OFFERED_TOKEN: &str = "1111111111111111111111111111111111111111111111111111111111111111";

    fn seller_pk() -> PublicKey {
        PublicKey::new(vec![0x02; 33])
    }

    fn payment() -> TxOutput {
        TxOutput::new(10_000, Script::p2pkh(&[0x95; 20]))
    }

    fn nft_utxo(token_type: TokenType) -> Utxo {
        Utxo {
            outpoint: Outpoint::new("00".repeat(32), 1),
            block_height: 800_000,
            is_coinbase: false,
            sats: 546,
            token: Some(Token {
                token_id: TokenId::new(OFFERED_TOKEN),
                token_type,
                atoms: 1,
                is_mint_baton: false,
            }),
        }
    }

    fn oneshot_entry() -> PluginEntry {
        let mut cancel_group = PUBKEY_GROUP_PREFIX.to_vec();
        cancel_group.extend_from_slice(seller_pk().as_bytes());
        PluginEntry {
            groups: vec![hex::encode(b"F1111"), hex::encode(cancel_group)],
            data: vec![
                hex::encode(ONESHOT_COVENANT_VARIANT),
                hex::encode(serialize_enforced_outputs(&[payment()])),
            ],
        }
    }

    #[test]
    fn test_plugin_entry_from_indexer_json() {
        let json = r#"{"groups": ["50aa"], "data": ["4f4e4553484f54"]}"#;
        let entry: PluginEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.groups, vec!["50aa".to_string()]);
        assert_eq!(hex::decode(&entry.data[0]).unwrap(), ONESHOT_COVENANT_VARIANT);
        assert_eq!(
            cancel_pk_from_groups(&entry.groups),
            Some(PublicKey::new(vec![0xaa]))
        );

        let empty: PluginEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PluginEntry::default());
    }

    #[test]
    fn test_offer_utxo_picks_agora_plugin() {
        let mut plugins = HashMap::new();
        plugins.insert("token_id_history".to_string(), PluginEntry::default());
        let offer = OfferUtxo::from_plugins(nft_utxo(TokenType::slp_nft1_child()), &plugins, None);
        assert_eq!(offer.plugin, None);

        plugins.insert(AGORA_PLUGIN_NAME.to_string(), oneshot_entry());
        let offer = OfferUtxo::from_plugins(nft_utxo(TokenType::slp_nft1_child()), &plugins, None);
        assert_eq!(offer.plugin, Some(oneshot_entry()));
        assert!(parse_agora_txs(&[offer])[0].is_some());
    }

    #[test]
    fn test_serialized_output_layout() {
        let bytes = serialize_enforced_outputs(&[payment()]);
        assert_eq!(
            hex::encode(&bytes),
            format!("1027000000000000{}76a914{}88ac", "19", "95".repeat(20))
        );
        assert_eq!(read_enforced_outputs(&bytes).unwrap(), vec![payment()]);
    }

    #[test]
    fn test_long_script_uses_three_byte_compact_size() {
        let output = TxOutput::new(1, Script::new(vec![0x51; 300]));
        let bytes = serialize_enforced_outputs(&[output.clone()]);
        assert_eq!(&bytes[8..11], &[0xfd, 0x2c, 0x01]);
        assert_eq!(read_enforced_outputs(&bytes).unwrap(), vec![output]);
    }

    #[test]
    fn test_truncated_outputs_are_rejected() {
        let bytes = serialize_enforced_outputs(&[payment()]);
        assert!(matches!(
            read_enforced_outputs(&bytes[..bytes.len() - 1]),
            Err(AgoraError::InvalidPluginData(_))
        ));
    }

    #[test]
    fn test_parse_oneshot_rebuilds_token_output() {
        let utxo = nft_utxo(TokenType::slp_nft1_child());
        let tx = parse_oneshot_offer(&utxo, &oneshot_entry(), None).unwrap();

        assert_eq!(tx.params.cancel_pk, seller_pk());
        assert_eq!(tx.params.enforced_outputs.len(), 2);
        assert_eq!(tx.params.enforced_outputs[0].sats, 0);
        assert_eq!(
            tx.params.enforced_outputs[0].script.to_hex(),
            format!(
                "6a04534c500001410453454e4420{OFFERED_TOKEN}08{}08{}",
                "0000000000000000", "0000000000000001"
            )
        );
        assert_eq!(tx.params.enforced_outputs[1], payment());
        assert_eq!(tx.tx_builder_input.prev_out, utxo.outpoint);
        assert_eq!(tx.tx_builder_input.sign_data.sats, 546);
    }

    #[test]
    fn test_parse_rejects_partial_and_missing_cancel_pk() {
        let utxo = nft_utxo(TokenType::slp_nft1_child());

        let mut partial = oneshot_entry();
        partial.data[0] = hex::encode(PARTIAL_COVENANT_VARIANT);
        assert_eq!(
            parse_oneshot_offer(&utxo, &partial, None),
            Err(AgoraError::UnsupportedVariant("PARTIAL".into()))
        );

        let mut no_pk = oneshot_entry();
        no_pk.groups.truncate(1);
        assert_eq!(
            parse_oneshot_offer(&utxo, &no_pk, None),
            Err(AgoraError::MissingCancelPk)
        );
    }

    #[test]
    fn test_parse_rejects_alp_token() {
        let utxo = nft_utxo(TokenType::alp_standard());
        assert_eq!(
            parse_oneshot_offer(&utxo, &oneshot_entry(), None),
            Err(AgoraError::NotSlpToken)
        );
    }

    #[test]
    fn test_plugin_offers_flow_into_offer_maps() {
        let nft = nft_utxo(TokenType::slp_nft1_child());
        let group = nft_utxo(TokenType::slp_nft1_group());
        let offers = vec![
            OfferUtxo {
                utxo: nft.clone(),
                plugin: Some(oneshot_entry()),
                spent_by: None,
            },
            OfferUtxo {
                utxo: nft,
                plugin: None,
                spent_by: None,
            },
            OfferUtxo {
                utxo: group,
                plugin: Some(oneshot_entry()),
                spent_by: None,
            },
        ];

        let parsed = parse_agora_txs(&offers);
        assert!(parsed[0].is_some());
        assert!(parsed[1].is_none());
        // Group listings parse fine here and are rejected when validated
        assert!(parsed[2].is_some());

        let maps = get_token_offer_maps(&parsed, Some(&seller_pk())).unwrap();
        assert_eq!(maps.my_listings.len(), 1);
        assert_eq!(maps.my_listings[&TokenId::new(OFFERED_TOKEN)].price_sats(), 10_000);
        assert!(maps.offered_listings.is_empty());
    }
}
