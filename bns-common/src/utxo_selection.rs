//! UTXO funding for naming transactions
//!
//! This module adds payer inputs to a transaction skeleton until its outputs
//! and fees are covered. Selection is deterministic and greedy: when a
//! single UTXO can cover what is left, the smallest such UTXO is taken;
//! otherwise the largest UTXO is consumed and the search continues with the
//! rest. Every added input raises the fee by its worst-case signed size.
//!
//! The engine is not fee-optimal. It reproduces the input choice other
//! clients make for the same UTXO set, so two clients funding the same
//! skeleton spend the same outputs.
//!
//! # Examples
//!
//! ```
//! use bitcoin::{absolute::LockTime, Transaction};
//! use bns_common::types::Utxo;
//! use bns_common::utxo_selection::fund;
//!
//! let tx = Transaction { version: 1, lock_time: LockTime::ZERO, input: vec![], output: vec![] };
//! let utxos = vec![Utxo::from_parts(
//!     "7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc",
//!     0,
//!     50_000,
//! ).unwrap()];
//!
//! let funded = fund(tx, &utxos, 10_000, 10, true).unwrap();
//! assert_eq!(funded.tx.input.len(), 1);
//! assert_eq!(funded.change, 38_520);
//! ```

use crate::error::{BnsError, BnsResult};
use crate::math::{calculate_fee, estimate_tx_bytes, marginal_input_fee, sum_output_values};
use crate::types::Utxo;
use bitcoin::{ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use log::debug;
use std::cmp::Reverse;

/// A transaction whose inputs cover its outputs and fees
#[derive(Debug, Clone, PartialEq)]
pub struct Funded {
    /// The transaction with payer inputs appended
    pub tx: Transaction,

    /// Value left over after funding, in satoshis
    pub change: u64,
}

/// Result of a funding pass
#[derive(Debug, Clone, PartialEq)]
pub enum FundingOutcome {
    /// The target was covered
    Funded(Funded),

    /// UTXOs ran out; the transaction keeps every input added so far
    Exhausted {
        tx: Transaction,
        /// Amount still left to fund
        shortfall: u64,
    },
}

impl FundingOutcome {
    /// Convert into a result, mapping exhaustion to `InsufficientFunds`
    pub fn into_result(self) -> BnsResult<Funded> {
        match self {
            FundingOutcome::Funded(funded) => Ok(funded),
            FundingOutcome::Exhausted { shortfall, .. } => {
                Err(BnsError::InsufficientFunds { shortfall })
            }
        }
    }
}

fn unsigned_input(utxo: &Utxo) -> TxIn {
    TxIn {
        previous_output: utxo.outpoint,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    }
}

fn shortfall_of(amount: i64) -> u64 {
    amount.max(0) as u64
}

/// Add inputs from `utxos` until `amount_to_fund` is covered
///
/// # Arguments
/// * `tx` - The transaction to fund
/// * `utxos` - Candidate UTXOs of the payer
/// * `amount_to_fund` - Satoshis still needed; negative when existing
///   inputs already over-fund the transaction
/// * `fee_rate` - Fee rate in satoshis per byte
/// * `include_new_fees` - Whether the fee of every added input is funded too
///
/// # Returns
/// * `FundingOutcome::Funded` with the change left over, or
///   `FundingOutcome::Exhausted` with the amount that could not be covered
pub fn fund_inputs(
    mut tx: Transaction,
    utxos: &[Utxo],
    amount_to_fund: i64,
    fee_rate: u64,
    include_new_fees: bool,
) -> FundingOutcome {
    let mut remaining: Vec<&Utxo> = utxos.iter().collect();
    let mut amount = amount_to_fund;

    loop {
        let Some((largest_position, largest)) = remaining
            .iter()
            .enumerate()
            // First of equal-valued UTXOs wins
            .min_by_key(|(_, utxo)| Reverse(utxo.value))
            .map(|(position, utxo)| (position, *utxo))
        else {
            debug!("No UTXOs left with {} satoshis to fund", amount);
            return FundingOutcome::Exhausted {
                tx,
                shortfall: shortfall_of(amount),
            };
        };

        let fee = marginal_input_fee(&tx, fee_rate) as i64;
        let threshold = if include_new_fees { amount + fee } else { amount };

        let smallest_sufficient = remaining
            .iter()
            .enumerate()
            .filter(|(_, utxo)| utxo.value as i64 >= threshold)
            .min_by_key(|(_, utxo)| utxo.value)
            .map(|(position, _)| position);

        if let Some(position) = smallest_sufficient {
            let selected = remaining[position];
            let mut change = selected.value as i64 - amount;
            if include_new_fees {
                change -= fee;
            }

            debug!(
                "Selected UTXO {} ({} sats) covering {} sats, change {}",
                selected.id(),
                selected.value,
                amount,
                change
            );

            tx.input.push(unsigned_input(selected));
            return FundingOutcome::Funded(Funded {
                tx,
                change: change.max(0) as u64,
            });
        }

        // No single UTXO covers the rest, consume the largest
        if fee >= largest.value as i64 {
            debug!(
                "Largest UTXO {} ({} sats) does not pay for its own input fee of {}",
                largest.id(),
                largest.value,
                fee
            );
            return FundingOutcome::Exhausted {
                tx,
                shortfall: shortfall_of(amount),
            };
        }

        debug!(
            "Consuming largest UTXO {} ({} sats), {} sats left to fund",
            largest.id(),
            largest.value,
            amount
        );

        tx.input.push(unsigned_input(largest));
        amount -= largest.value as i64;
        if include_new_fees {
            amount += fee;
        }
        remaining.remove(largest_position);
    }
}

/// Fund `amount_to_fund` from `utxos`, failing when the UTXOs run out
pub fn fund(
    tx: Transaction,
    utxos: &[Utxo],
    amount_to_fund: i64,
    fee_rate: u64,
    include_new_fees: bool,
) -> BnsResult<Funded> {
    fund_inputs(tx, utxos, amount_to_fund, fee_rate, include_new_fees).into_result()
}

/// Fund a transaction's outputs and fees from a payer, paying change back
///
/// When `change_index` is `None` a new change output paying `dust_minimum`
/// to `change_script` is appended first; otherwise the change is added to
/// the existing output at that index.
///
/// # Arguments
/// * `tx` - The transaction skeleton
/// * `change_script` - Script of the payer's change output
/// * `utxos` - The payer's UTXOs
/// * `fee_rate` - Fee rate in satoshis per byte
/// * `in_amounts` - Value already brought in by existing inputs
/// * `change_index` - Output that receives the change, if one already exists
/// * `dust_minimum` - Value of a newly created change output
pub fn fund_transaction(
    mut tx: Transaction,
    change_script: &ScriptBuf,
    utxos: &[Utxo],
    fee_rate: u64,
    in_amounts: u64,
    change_index: Option<usize>,
    dust_minimum: u64,
) -> BnsResult<Transaction> {
    let change_index = match change_index {
        Some(index) if index < tx.output.len() => index,
        Some(index) => {
            return Err(BnsError::validation(format!(
                "change output {} does not exist in a transaction with {} outputs",
                index,
                tx.output.len()
            )))
        }
        None => {
            tx.output.push(TxOut {
                value: dust_minimum,
                script_pubkey: change_script.clone(),
            });
            tx.output.len() - 1
        }
    };

    let tx_fee = calculate_fee(estimate_tx_bytes(&tx, 0, 0), fee_rate);
    let out_amounts = sum_output_values(&tx);
    let amount = tx_fee as i64 + out_amounts as i64 - in_amounts as i64;

    let Funded { mut tx, change } = fund(tx, utxos, amount, fee_rate, true)?;
    tx.output[change_index].value += change;

    debug!(
        "Funded transaction with {} inputs, {} sats change to output {}",
        tx.input.len(),
        change,
        change_index
    );

    Ok(tx)
}
