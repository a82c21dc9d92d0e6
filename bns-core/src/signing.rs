//! Multi-party input signing and final serialization
//!
//! Every input is assigned a signer: the default signer unless an override
//! names the input. Inputs are then signed one at a time in ascending index
//! order, each signer awaited before the next one starts.

use crate::signer::TransactionSigner;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::Transaction;
use bns_common::error::{BnsError, BnsResult};
use bns_common::logging::{log_params, log_signing, LogLevel};

/// Sign every input of `tx`
///
/// # Arguments
/// * `tx` - The funded transaction
/// * `default_signer` - Signer for every input without an override
/// * `overrides` - `(input index, signer)` pairs; later pairs win
///
/// # Returns
/// The signed transaction, or a `Validation` error when an override names
/// an input that does not exist
pub async fn sign_inputs(
    mut tx: Transaction,
    default_signer: &dyn TransactionSigner,
    overrides: &[(usize, &dyn TransactionSigner)],
) -> BnsResult<Transaction> {
    let mut signers: Vec<&dyn TransactionSigner> = vec![default_signer; tx.input.len()];

    for (index, signer) in overrides {
        match signers.get_mut(*index) {
            Some(slot) => *slot = *signer,
            None => {
                return Err(BnsError::validation(format!(
                    "Signer override for input {} but the transaction has {} inputs",
                    index,
                    tx.input.len()
                )))
            }
        }
    }

    for (index, signer) in signers.into_iter().enumerate() {
        signer.sign_input(&mut tx, index).await?;
    }

    log_signing(
        LogLevel::Debug,
        "Signed transaction inputs",
        Some(log_params(vec![
            ("inputs", tx.input.len().to_string()),
            ("overrides", overrides.len().to_string()),
        ])),
    );
    Ok(tx)
}

/// Hex encoding of `tx`
///
/// Unless `build_incomplete` is set, every input must carry a scriptSig or
/// a witness.
pub fn serialize_transaction(tx: &Transaction, build_incomplete: bool) -> BnsResult<String> {
    if !build_incomplete {
        let unsigned = tx
            .input
            .iter()
            .position(|txin| txin.script_sig.is_empty() && txin.witness.is_empty());

        if let Some(index) = unsigned {
            return Err(BnsError::Signing(format!(
                "Input {} of {} is not signed",
                index,
                tx.txid()
            )));
        }
    }

    Ok(serialize_hex(tx))
}
