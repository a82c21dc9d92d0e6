//! Property-based tests for the funding engine
//!
//! Every input added to an empty transaction costs the same marginal fee,
//! which makes the outcome of a funding pass predictable from the UTXO
//! values alone.


use bns_common::math::{calculate_fee, TX_INPUT_BASE, TX_INPUT_PUBKEYHASH};
use bns_common::types::Utxo;
use bns_common::utxo_selection::{fund_inputs, FundingOutcome};
use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use test_utils::*;

#[derive(Clone, Debug)]
struct FundingCase {
    values: Vec<u64>,
    target: u64,
    fee_rate: u64,
}

impl Arbitrary for FundingCase {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = usize::arbitrary(g) % 12;
        let values = (0..count)
            .map(|_| 1 + u64::arbitrary(g) % 200_000)
            .collect();

        FundingCase {
            values,
            target: 1 + u64::arbitrary(g) % 500_000,
            fee_rate: u64::arbitrary(g) % 60,
        }
    }
}

impl FundingCase {
    fn utxos(&self) -> Vec<Utxo> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| utxo(i as u8, *value))
            .collect()
    }

    fn marginal_fee(&self) -> u64 {
        calculate_fee(TX_INPUT_BASE + TX_INPUT_PUBKEYHASH, self.fee_rate)
    }

    /// Value the UTXO set can contribute once each input has paid for itself
    fn spendable(&self) -> u64 {
        let fee = self.marginal_fee();
        self.values.iter().map(|v| v.saturating_sub(fee)).sum()
    }
}

#[quickcheck]
fn funded_change_balances_inputs_and_fees(case: FundingCase) -> TestResult {
    let utxos = case.utxos();

    match fund_inputs(empty_tx(), &utxos, case.target as i64, case.fee_rate, true) {
        FundingOutcome::Funded(funded) => {
            let spent: u64 = funded
                .tx
                .input
                .iter()
                .filter_map(|txin| utxos.iter().find(|u| u.outpoint == txin.previous_output))
                .map(|u| u.value)
                .sum();
            let fees = case.marginal_fee() * funded.tx.input.len() as u64;

            TestResult::from_bool(spent == case.target + fees + funded.change)
        }
        FundingOutcome::Exhausted { .. } => TestResult::discard(),
    }
}

#[quickcheck]
fn funding_fails_iff_spendable_value_is_short(case: FundingCase) -> bool {
    let outcome = fund_inputs(empty_tx(), &case.utxos(), case.target as i64, case.fee_rate, true);
    let short = case.spendable() < case.target;

    match outcome {
        FundingOutcome::Funded(_) => !short,
        FundingOutcome::Exhausted { shortfall, .. } => {
            short && shortfall == case.target - case.spendable()
        }
    }
}

#[quickcheck]
fn selected_inputs_are_distinct(case: FundingCase) -> bool {
    let tx = match fund_inputs(empty_tx(), &case.utxos(), case.target as i64, case.fee_rate, true) {
        FundingOutcome::Funded(funded) => funded.tx,
        FundingOutcome::Exhausted { tx, .. } => tx,
    };

    let mut outpoints: Vec<_> = tx.input.iter().map(|txin| txin.previous_output).collect();
    let before = outpoints.len();
    outpoints.sort();
    outpoints.dedup();
    outpoints.len() == before
}
