
use bitcoin::{ScriptBuf, TxOut};
use bns_common::math::*;
use test_utils::*;

#[test]
fn test_empty_transaction() {
    assert_eq!(estimate_tx_bytes(&empty_tx(), 0, 0), 10);
}

#[test]
fn test_hypothetical_inputs_and_outputs() {
    let tx = empty_tx();
    assert_eq!(estimate_tx_bytes(&tx, 1, 0), 10 + 148);
    assert_eq!(estimate_tx_bytes(&tx, 0, 1), 10 + 34);
    assert_eq!(estimate_tx_bytes(&tx, 2, 3), 10 + 2 * 148 + 3 * 34);
}

#[test]
fn test_signed_inputs_use_script_length() {
    let mut tx = empty_tx();
    let mut input = unsigned_input(utxo(1, 1).outpoint);
    input.script_sig = ScriptBuf::from_bytes(vec![0u8; 106]);
    tx.input.push(input);

    assert_eq!(estimate_tx_bytes(&tx, 0, 0), 10 + 41 + 106);
}

#[test]
fn test_outputs_and_sums() {
    let mut tx = empty_tx();
    tx.output.push(TxOut {
        value: 0,
        script_pubkey: null_data_script(),
    });
    tx.output.push(TxOut {
        value: 5_500,
        script_pubkey: p2pkh_script(1),
    });
    tx.output.push(TxOut {
        value: 1_000,
        script_pubkey: p2pkh_script(2),
    });

    assert_eq!(estimate_tx_bytes(&tx, 0, 0), 10 + 14 + 34 + 34);
    assert_eq!(sum_output_values(&tx), 6_500);
    assert_eq!(marginal_input_fee(&tx, 3), 444);
    assert_eq!(min_economical_change(&tx, 3), 102);
}

#[test]
fn test_estimate_matches_serialized_unsigned_size() {
    let mut tx = empty_tx();
    tx.input.push(unsigned_input(utxo(1, 1).outpoint));
    tx.output.push(TxOut {
        value: 5_500,
        script_pubkey: p2pkh_script(1),
    });

    // The estimate counts the scriptSig the input will carry once signed
    let unsigned = bitcoin::consensus::encode::serialize(&tx).len();
    assert_eq!(estimate_tx_bytes(&tx, 0, 0), unsigned + TX_INPUT_PUBKEYHASH);
}
