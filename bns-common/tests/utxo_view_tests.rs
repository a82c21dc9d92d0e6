
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Network, OutPoint, TxOut};
use bns_common::error::BnsError;
use bns_common::utxo_management::UtxoSetView;
use test_utils::*;

fn broadcast_tx(spent: &[OutPoint]) -> bitcoin::Transaction {
    let mut tx = empty_tx();
    tx.input = spent.iter().copied().map(unsigned_input).collect();
    tx.output.push(TxOut {
        value: 0,
        script_pubkey: null_data_script(),
    });
    tx.output.push(TxOut {
        value: 5_500,
        script_pubkey: p2pkh_script(3),
    });
    tx.output.push(TxOut {
        value: 42_000,
        script_pubkey: p2pkh_script(9),
    });
    tx
}

#[test]
fn test_new_view_passes_chain_view_through() {
    init_test_environment();

    let view = UtxoSetView::new(Network::Testnet);
    let chain = vec![utxo(1, 10_000), utxo(2, 20_000)];

    let address = p2pkh_address(9, Network::Testnet);
    assert_eq!(view.utxos(&address, chain.clone()), chain);
}

#[test]
fn test_advance_excludes_spent_and_includes_outputs() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);
    let spent = utxo(1, 50_000);
    let kept = utxo(2, 7_000);
    let tx = broadcast_tx(&[spent.outpoint]);
    let txid = tx.txid();

    view.advance(&serialize_hex(&tx)).expect("advance should succeed");

    assert!(view.is_excluded(&spent.outpoint));

    let payer = p2pkh_address(9, Network::Testnet);
    let utxos = view.utxos(&payer, vec![spent.clone(), kept.clone()]);

    assert_eq!(utxos.len(), 2);
    assert_eq!(utxos[0], kept);
    assert_eq!(utxos[1].outpoint, OutPoint::new(txid, 2));
    assert_eq!(utxos[1].value, 42_000);
    assert_eq!(utxos[1].confirmations, Some(0));

    let recipient = p2pkh_address(3, Network::Testnet);
    assert_eq!(view.included(&recipient).len(), 1);
    assert_eq!(view.included(&recipient)[0].outpoint, OutPoint::new(txid, 1));
}

#[test]
fn test_null_data_outputs_are_not_tracked() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);
    let tx = broadcast_tx(&[utxo(1, 50_000).outpoint]);
    view.advance(&serialize_hex(&tx)).unwrap();

    let txid = tx.txid();
    let tracked: Vec<OutPoint> = [3u8, 9u8]
        .iter()
        .flat_map(|seed| view.included(&p2pkh_address(*seed, Network::Testnet)).to_vec())
        .map(|u| u.outpoint)
        .collect();

    assert!(!tracked.contains(&OutPoint::new(txid, 0)));
    assert_eq!(tracked.len(), 2);
}

#[test]
fn test_chained_transactions_spend_overlay_outputs() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);
    let first = broadcast_tx(&[utxo(1, 50_000).outpoint]);
    view.advance(&serialize_hex(&first)).unwrap();

    let change = OutPoint::new(first.txid(), 2);
    let second = broadcast_tx(&[change]);
    view.advance(&serialize_hex(&second)).unwrap();

    let payer = p2pkh_address(9, Network::Testnet);
    let utxos = view.utxos(&payer, vec![]);

    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].outpoint, OutPoint::new(second.txid(), 2));
}

#[test]
fn test_duplicates_between_chain_and_overlay_are_merged() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);
    let tx = broadcast_tx(&[utxo(1, 50_000).outpoint]);
    view.advance(&serialize_hex(&tx)).unwrap();

    let payer = p2pkh_address(9, Network::Testnet);
    let indexed = view.included(&payer)[0].clone().with_confirmations(1);
    let utxos = view.utxos(&payer, vec![indexed.clone()]);

    assert_eq!(utxos, vec![indexed]);
}

#[test]
fn test_reset_clears_overlay_and_exclusions() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);
    let spent = utxo(1, 50_000);
    view.advance(&serialize_hex(&broadcast_tx(&[spent.outpoint]))).unwrap();

    let payer = p2pkh_address(9, Network::Testnet);
    view.reset(&payer);

    assert!(view.included(&payer).is_empty());
    assert!(!view.is_excluded(&spent.outpoint));
    assert_eq!(view.utxos(&payer, vec![spent.clone()]), vec![spent]);

    // Other addresses keep their overlay
    assert_eq!(view.included(&p2pkh_address(3, Network::Testnet)).len(), 1);
}

#[test]
fn test_advance_rejects_malformed_hex() {
    init_test_environment();

    let mut view = UtxoSetView::new(Network::Testnet);

    assert!(matches!(
        view.advance("not hex"),
        Err(BnsError::Serialization { .. })
    ));
    assert!(matches!(
        view.advance("0100"),
        Err(BnsError::Serialization { .. })
    ));
}
