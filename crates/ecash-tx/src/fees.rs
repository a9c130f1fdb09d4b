//! Size-based fee estimation
//!
//! Fees are charged per serialized byte at a rate quoted in sats per 1000
//! bytes, rounded up. Inputs are assumed to be P2PKH spends signed with a
//! 65-byte Schnorr signature.

use ecash_core::Sats;

use crate::tx::TxOutput;

/// Signed P2PKH input: outpoint (36) + script len (1) + sig push (66) +
/// pubkey push (34) + sequence (4)
pub const P2PKH_INPUT_SIZE: usize = 141;

/// P2PKH output: value (8) + script len (1) + script (25)
pub const P2PKH_OUTPUT_SIZE: usize = 34;

/// Version and locktime
const TX_FIXED_SIZE: usize = 8;

/// Bytes taken by a compact-size encoding of `n`
pub fn compact_size_len(n: usize) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Serialized size of one output
pub fn output_size(output: &TxOutput) -> usize {
    let script_len = output.script.len();
    8 + compact_size_len(script_len) + script_len
}

/// Serialized size of a tx spending `num_p2pkh_inputs` P2PKH inputs into
/// `outputs` plus `extra_p2pkh_outputs` P2PKH outputs whose scripts are not
/// known yet (change, a max send recipient).
pub fn estimate_tx_size(
    num_p2pkh_inputs: usize,
    outputs: &[TxOutput],
    extra_p2pkh_outputs: usize,
) -> usize {
    let num_outputs = outputs.len() + extra_p2pkh_outputs;
    TX_FIXED_SIZE
        + compact_size_len(num_p2pkh_inputs)
        + num_p2pkh_inputs * P2PKH_INPUT_SIZE
        + compact_size_len(num_outputs)
        + outputs.iter().map(output_size).sum::<usize>()
        + extra_p2pkh_outputs * P2PKH_OUTPUT_SIZE
}

/// Fee for a tx of `size` bytes at `fee_per_kb`, rounded up to the next sat
pub fn calc_tx_fee(size: usize, fee_per_kb: Sats) -> Sats {
    let fee = (size as u128 * u128::from(fee_per_kb) + 999) / 1000;
    u64::try_from(fee).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    fn p2pkh_output(sats: Sats) -> TxOutput {
        TxOutput::new(sats, Script::p2pkh(&[0x33; 20]))
    }

    #[test]
    fn test_one_in_two_out_p2pkh_size() {
        assert_eq!(output_size(&p2pkh_output(1_000)), P2PKH_OUTPUT_SIZE);
        assert_eq!(estimate_tx_size(1, &[p2pkh_output(1_000)], 1), 219);
        assert_eq!(estimate_tx_size(1, &[p2pkh_output(1_000), p2pkh_output(2_000)], 0), 219);
    }

    #[test]
    fn test_op_return_output_size() {
        let op_return = TxOutput::op_return(Script::new(vec![0x6a; 10]));
        assert_eq!(output_size(&op_return), 19);
        assert_eq!(estimate_tx_size(2, &[op_return], 1), 8 + 1 + 282 + 1 + 19 + 34);
    }

    #[test]
    fn test_fee_rounds_up() {
        assert_eq!(calc_tx_fee(219, 1000), 219);
        assert_eq!(calc_tx_fee(219, 1001), 220);
        assert_eq!(calc_tx_fee(1, 1), 1);
        assert_eq!(calc_tx_fee(0, 1000), 0);
        assert_eq!(calc_tx_fee(usize::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_large_counts_use_wider_compact_size() {
        assert_eq!(compact_size_len(252), 1);
        assert_eq!(compact_size_len(253), 3);
        assert_eq!(compact_size_len(0x1_0000), 5);
        assert_eq!(
            estimate_tx_size(253, &[], 1),
            8 + 3 + 253 * P2PKH_INPUT_SIZE + 1 + P2PKH_OUTPUT_SIZE
        );
    }
}
