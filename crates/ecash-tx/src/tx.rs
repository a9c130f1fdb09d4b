//! Transaction input and output structures
//!
//! These mirror the shapes the indexer and the signer exchange. Values are
//! in sats; scripts are raw bytes serialized as hex.

use ecash_core::constants::DUST_SATS;
use ecash_core::{Outpoint, Sats};
use serde::{Deserialize, Serialize};

use crate::script::Script;

/// A fully specified transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    pub sats: Sats,
    pub script: Script,
}

impl TxOutput {
    pub fn new(sats: Sats, script: Script) -> Self {
        Self { sats, script }
    }

    /// Zero-value OP_RETURN output carrying `script`
    pub fn op_return(script: Script) -> Self {
        Self { sats: 0, script }
    }
}

/// Output requested from the transaction builder.
///
/// An output without a script is paid to the wallet's own change script
/// when the transaction is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOutput {
    pub sats: Sats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
}

impl TargetOutput {
    pub fn new(sats: Sats, script: Script) -> Self {
        Self {
            sats,
            script: Some(script),
        }
    }

    pub fn op_return(script: Script) -> Self {
        Self::new(0, script)
    }

    /// Dust output that receives tokens at the wallet's change script
    pub fn token_dust_change() -> Self {
        Self {
            sats: DUST_SATS,
            script: None,
        }
    }

    /// Fill in `change_script` if no script was requested
    pub fn resolve(self, change_script: &Script) -> TxOutput {
        TxOutput {
            sats: self.sats,
            script: self.script.unwrap_or_else(|| change_script.clone()),
        }
    }
}

/// Data the signer needs for a previous output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignData {
    pub sats: Sats,
    /// Script committed to by a P2SH output, e.g. a covenant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<Script>,
}

/// An input handed to the transaction builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxBuilderInput {
    pub prev_out: Outpoint,
    pub sign_data: SignData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_change_script() {
        let change = Script::p2pkh(&[0x11; 20]);
        let dest = Script::p2pkh(&[0x22; 20]);

        let resolved = TargetOutput::token_dust_change().resolve(&change);
        assert_eq!(resolved, TxOutput::new(DUST_SATS, change.clone()));

        let resolved = TargetOutput::new(1_000, dest.clone()).resolve(&change);
        assert_eq!(resolved.script, dest);
    }

    #[test]
    fn test_builder_input_serde() {
        let input = TxBuilderInput {
            prev_out: Outpoint::new("ab".repeat(32), 1),
            sign_data: SignData {
                sats: 546,
                redeem_script: Some(Script::new(vec![0x51])),
            },
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["prevOut"]["outIdx"], 1);
        assert_eq!(json["signData"]["redeemScript"], "51");
        let parsed: TxBuilderInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, input);
    }
}
