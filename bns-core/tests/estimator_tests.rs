
use bns_core::namespace::NamespaceDescriptor;
use bns_core::payload::hash160;
use bns_core::signer::SignerInput;
use num_bigint::BigUint;
use test_utils::*;

const DUST: u64 = bns_common::types::DUST_MINIMUM;

fn backend() -> MockBackend {
    MockBackend::new().with_utxos(&address_of(PAYER_KEY), vec![utxo(1, 100_000)])
}

#[tokio::test]
async fn test_name_operation_estimates() {
    init_test_environment();

    let network = naming_network(backend());
    let builder = network.builder().unwrap();
    let owner = address_of(OWNER_KEY);
    let payer = address_of(PAYER_KEY);
    let destination = p2pkh_address(5, NETWORK);

    // fee at 10 sat/byte plus every output value
    assert_eq!(
        builder.estimate_preorder("hello.id", &owner, &payer, 1).await.unwrap(),
        2_760 + DUST + NAME_PRICE
    );
    assert_eq!(
        builder.estimate_register("hello.id", &owner, true, 1).await.unwrap(),
        2_970 + DUST
    );
    assert_eq!(
        builder.estimate_register("hello.id", &owner, false, 1).await.unwrap(),
        2_480 + DUST
    );
    assert_eq!(builder.estimate_update("hello.id", 1).await.unwrap(), 4_240);
    assert_eq!(
        builder.estimate_transfer("hello.id", &destination, 1).await.unwrap(),
        4_550 + DUST
    );
    assert_eq!(
        builder
            .estimate_renewal("hello.id", &destination, &owner, false, 1)
            .await
            .unwrap(),
        4_640 + 2 * DUST + NAME_PRICE
    );
    assert_eq!(builder.estimate_revoke("hello.id", 1).await.unwrap(), 3_960);
}

#[tokio::test]
async fn test_namespace_and_misc_estimates() {
    init_test_environment();

    let network = naming_network(backend());
    let builder = network.builder().unwrap();
    let reveal = p2pkh_address(6, NETWORK);
    let payer = address_of(PAYER_KEY);

    assert_eq!(
        builder
            .estimate_namespace_preorder("hello", &reveal, &payer, 1)
            .await
            .unwrap(),
        2_760 + DUST + NAMESPACE_PRICE
    );

    let mut namespace = NamespaceDescriptor::new("hello").unwrap();
    namespace
        .set_lifetime(52_595)
        .unwrap()
        .set_nonalpha_discount(10)
        .unwrap()
        .set_no_vowel_discount(10)
        .unwrap();
    assert_eq!(
        builder
            .estimate_namespace_reveal(&namespace, &reveal, 1)
            .await
            .unwrap(),
        2_620 + DUST
    );

    assert_eq!(builder.estimate_namespace_ready("hello", 1).await.unwrap(), 2_120);

    let zonefile_hash = hex::encode(hash160(b"zonefile"));
    assert_eq!(
        builder
            .estimate_name_import("hello.id", &p2pkh_address(7, NETWORK), &zonefile_hash, 1)
            .await
            .unwrap(),
        2_820 + 2 * DUST
    );

    let message_hash = hex::encode(hash160(b"hello world"));
    assert_eq!(builder.estimate_announce(&message_hash, 1).await.unwrap(), 2_260);

    assert_eq!(
        builder
            .estimate_token_transfer(
                &p2pkh_address(8, NETWORK),
                "STACKS",
                &BigUint::from(1_000u64),
                "memo",
                1,
                1,
            )
            .await
            .unwrap(),
        2_870 + DUST
    );

    assert_eq!(
        builder
            .estimate_bitcoin_spend(&p2pkh_address(9, NETWORK), 50_000, 1)
            .await
            .unwrap(),
        52_260
    );
}

#[tokio::test]
async fn test_estimators_are_idempotent() {
    init_test_environment();

    let network = naming_network(backend());
    let builder = network.builder().unwrap();
    let owner = address_of(OWNER_KEY);
    let payer = address_of(PAYER_KEY);

    let first = builder.estimate_preorder("hello.id", &owner, &payer, 2).await.unwrap();
    let second = builder.estimate_preorder("hello.id", &owner, &payer, 2).await.unwrap();
    assert_eq!(first, second);

    let first = builder.estimate_update("hello.id", 3).await.unwrap();
    let second = builder.estimate_update("hello.id", 3).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(network.backend().broadcast_count(), 0);
}

#[tokio::test]
async fn test_each_payment_input_adds_its_fee() {
    init_test_environment();

    let network = naming_network(backend());
    let builder = network.builder().unwrap();

    let one = builder.estimate_revoke("hello.id", 1).await.unwrap();
    let three = builder.estimate_revoke("hello.id", 3).await.unwrap();
    assert_eq!(three - one, 2 * 148 * FEE_RATE);
}

#[tokio::test]
async fn test_preorder_estimate_matches_built_transaction() {
    init_test_environment();

    let network = naming_network(backend());
    let builder = network.builder().unwrap();
    let owner = address_of(OWNER_KEY);
    let payer = address_of(PAYER_KEY);

    let estimate = builder.estimate_preorder("hello.id", &owner, &payer, 1).await.unwrap();
    let tx = decode_tx(
        &builder
            .make_preorder("hello.id", &owner, SignerInput::from(PAYER_KEY))
            .await
            .unwrap(),
    );

    let fee = paid_fee(&tx, &[utxo(1, 100_000)]);
    assert_eq!(estimate, fee + DUST + NAME_PRICE);
}

#[tokio::test]
async fn test_zero_fee_rate_falls_back_to_config() {
    init_test_environment();

    let default_rate = naming_network(backend());
    let no_estimate = naming_network(backend().with_fee_rate(0));

    let expected = default_rate
        .builder()
        .unwrap()
        .estimate_revoke("hello.id", 1)
        .await
        .unwrap();
    let fallback = no_estimate
        .builder()
        .unwrap()
        .estimate_revoke("hello.id", 1)
        .await
        .unwrap();

    assert_eq!(test_config().transactions.default_fee_rate, FEE_RATE);
    assert_eq!(fallback, expected);
}
