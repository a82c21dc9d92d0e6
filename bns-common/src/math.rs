//! Transaction size and fee calculations
//!
//! The fee model is byte-accurate for legacy pay-to-pubkey-hash spends.
//! Inputs and outputs that already exist in a transaction are measured by
//! their real script length; inputs that are not signed yet and hypothetical
//! inputs/outputs are counted at the worst-case P2PKH size, so a fee computed
//! here tracks the size of the transaction once it is signed.
//!
//! Example:
//! ```
//! use bitcoin::{absolute::LockTime, Transaction};
//! use bns_common::math::{estimate_tx_bytes, TX_EMPTY_SIZE};
//!
//! let tx = Transaction { version: 1, lock_time: LockTime::ZERO, input: vec![], output: vec![] };
//! assert_eq!(estimate_tx_bytes(&tx, 0, 0), TX_EMPTY_SIZE);
//! assert_eq!(estimate_tx_bytes(&tx, 1, 0) - estimate_tx_bytes(&tx, 0, 0), 148);
//! ```

use bitcoin::{Transaction, TxIn, TxOut};

/// Version, input count, output count and lock time
pub const TX_EMPTY_SIZE: usize = 4 + 1 + 1 + 4;

/// Outpoint, script length byte and sequence
pub const TX_INPUT_BASE: usize = 32 + 4 + 1 + 4;

/// Worst-case scriptSig of a signed P2PKH input
pub const TX_INPUT_PUBKEYHASH: usize = 107;

/// Value and script length byte
pub const TX_OUTPUT_BASE: usize = 8 + 1;

/// P2PKH scriptPubKey
pub const TX_OUTPUT_PUBKEYHASH: usize = 25;

/// Size of one input, measured by its scriptSig once it has one
pub fn input_bytes(input: Option<&TxIn>) -> usize {
    match input {
        Some(txin) if !txin.script_sig.is_empty() => TX_INPUT_BASE + txin.script_sig.len(),
        _ => TX_INPUT_BASE + TX_INPUT_PUBKEYHASH,
    }
}

/// Size of one output, measured by its script once it has one
pub fn output_bytes(output: Option<&TxOut>) -> usize {
    match output {
        Some(txout) if !txout.script_pubkey.is_empty() => {
            TX_OUTPUT_BASE + txout.script_pubkey.len()
        }
        _ => TX_OUTPUT_BASE + TX_OUTPUT_PUBKEYHASH,
    }
}

/// Estimates the serialized size of a transaction in bytes
///
/// # Arguments
/// * `tx` - The transaction in progress
/// * `additional_inputs` - Hypothetical P2PKH inputs to add
/// * `additional_outputs` - Hypothetical P2PKH outputs to add
///
/// # Returns
/// The estimated size once every input is signed
pub fn estimate_tx_bytes(tx: &Transaction, additional_inputs: usize, additional_outputs: usize) -> usize {
    let inputs_size: usize = tx.input.iter().map(|txin| input_bytes(Some(txin))).sum::<usize>()
        + additional_inputs * input_bytes(None);

    let outputs_size: usize = tx.output.iter().map(|txout| output_bytes(Some(txout))).sum::<usize>()
        + additional_outputs * output_bytes(None);

    inputs_size + outputs_size + TX_EMPTY_SIZE
}

/// Sum of all output values in satoshis
pub fn sum_output_values(tx: &Transaction) -> u64 {
    tx.output.iter().map(|txout| txout.value).sum()
}

/// Calculates the fee for a transaction based on size and fee rate
///
/// # Arguments
/// * `tx_bytes` - The size of the transaction in bytes
/// * `fee_rate` - The fee rate in satoshis per byte
pub fn calculate_fee(tx_bytes: usize, fee_rate: u64) -> u64 {
    tx_bytes as u64 * fee_rate
}

/// Fee for adding one more P2PKH input to `tx`
pub fn marginal_input_fee(tx: &Transaction, fee_rate: u64) -> u64 {
    let grown = estimate_tx_bytes(tx, 1, 0) - estimate_tx_bytes(tx, 0, 0);
    calculate_fee(grown, fee_rate)
}

/// Fee for adding one more P2PKH output to `tx`
pub fn marginal_output_fee(tx: &Transaction, fee_rate: u64) -> u64 {
    let grown = estimate_tx_bytes(tx, 0, 1) - estimate_tx_bytes(tx, 0, 0);
    calculate_fee(grown, fee_rate)
}

/// Calculates the minimum change amount that would be economical to create
///
/// A change output is only worth adding when it is larger than the fee
/// paid for the bytes it adds.
pub fn min_economical_change(tx: &Transaction, fee_rate: u64) -> u64 {
    marginal_output_fee(tx, fee_rate)
}
