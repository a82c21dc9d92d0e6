
use bitcoin::Network;
use bns_common::error::{BnsError, ErrorCategory};
use bns_common::types::{is_dust, NetworkKind, PriceQuote, PriceUnit, Utxo, DUST_MINIMUM};
use bns_common::validation::{
    decode_fixed_hex, namespace_of, parse_address, validate_ascii_field, validate_name,
    validate_namespace_id,
};
use num_bigint::BigUint;
use serde_json::json;
use test_utils::*;

#[test]
fn test_utxo_uses_provider_field_names() {
    let value = json!({
        "tx_hash": "7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc",
        "tx_output_n": 3,
        "value": 12_345,
        "confirmations": 2
    });

    let utxo: Utxo = serde_json::from_value(value.clone()).expect("valid utxo json");
    assert_eq!(utxo.outpoint.vout, 3);
    assert_eq!(utxo.value, 12_345);
    assert_eq!(utxo.confirmations, Some(2));
    assert_eq!(serde_json::to_value(&utxo).unwrap(), value);

    let unconfirmed: Utxo = serde_json::from_value(json!({
        "tx_hash": "7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc",
        "tx_output_n": 0,
        "value": 1
    }))
    .unwrap();
    assert_eq!(unconfirmed.confirmations, None);
}

#[test]
fn test_utxo_from_parts_rejects_bad_txid() {
    assert!(matches!(
        Utxo::from_parts("abcd", 0, 1),
        Err(BnsError::Validation(_))
    ));
    assert_eq!(utxo(1, 5).id(), format!("{}:0", txid(1)));
}

#[test]
fn test_price_quotes() {
    let native = PriceQuote::native(6_400_000);
    assert!(!native.is_token());
    assert_eq!(native.burn_output_value(DUST_MINIMUM).unwrap(), 6_400_000);

    let token = PriceQuote::token("STACKS", BigUint::from(1_000_000u64));
    assert!(token.is_token());
    assert_eq!(token.unit, PriceUnit::Token("STACKS".to_string()));
    assert_eq!(token.unit.to_string(), "STACKS");
    assert_eq!(token.burn_output_value(DUST_MINIMUM).unwrap(), DUST_MINIMUM);
    assert_eq!(token.amount_u64().unwrap(), 1_000_000);

    let huge = PriceQuote::token("STACKS", BigUint::from(u64::MAX) + 1u32);
    assert!(matches!(huge.amount_u64(), Err(BnsError::Validation(_))));
}

#[test]
fn test_network_kind_parsing() {
    assert_eq!("mainnet".parse::<NetworkKind>().unwrap(), NetworkKind::Mainnet);
    assert_eq!("Bitcoin".parse::<NetworkKind>().unwrap(), NetworkKind::Mainnet);
    assert_eq!(" testnet ".parse::<NetworkKind>().unwrap(), NetworkKind::Testnet);
    assert_eq!(NetworkKind::Regtest.to_bitcoin(), Network::Regtest);
    assert!("signet".parse::<NetworkKind>().is_err());
}

#[test]
fn test_is_dust() {
    assert!(is_dust(5_499, DUST_MINIMUM));
    assert!(!is_dust(5_500, DUST_MINIMUM));
}

#[test]
fn test_decode_fixed_hex() {
    let hash: [u8; 16] = decode_fixed_hex("consensus hash", &"ab".repeat(16)).unwrap();
    assert_eq!(hash, [0xab; 16]);

    assert!(decode_fixed_hex::<16>("consensus hash", &"ab".repeat(15)).is_err());
    assert!(decode_fixed_hex::<20>("value hash", "zz").is_err());
}

#[test]
fn test_name_validation() {
    assert!(validate_name("muneeb.id").is_ok());
    assert!(validate_name("a-b_c+d.id").is_ok());
    assert!(validate_name("").is_err());
    assert!(validate_name("Muneeb.id").is_err());
    assert!(validate_name(&format!("{}.id", "a".repeat(35))).is_err());
    assert!(validate_name(&format!("{}.id", "a".repeat(34))).is_ok());

    assert_eq!(namespace_of("muneeb.id").unwrap(), "id");
    assert_eq!(namespace_of("a.b.id").unwrap(), "id");
    assert!(namespace_of("muneeb").is_err());
}

#[test]
fn test_namespace_id_validation() {
    assert!(validate_namespace_id("id").is_ok());
    assert!(validate_namespace_id("my-space_1").is_ok());
    assert!(validate_namespace_id("").is_err());
    assert!(validate_namespace_id("a.b").is_err());
    assert!(validate_namespace_id(&"a".repeat(20)).is_err());
}

#[test]
fn test_parse_address_checks_network() {
    let mainnet = p2pkh_address(5, Network::Bitcoin);
    assert!(parse_address(&mainnet, Network::Bitcoin).is_ok());
    assert!(parse_address(&mainnet, Network::Testnet).is_err());
    assert!(parse_address("not-an-address", Network::Bitcoin).is_err());
}

#[test]
fn test_ascii_field_validation() {
    assert!(validate_ascii_field("token type", "STACKS", 19).is_ok());
    assert!(validate_ascii_field("token type", &"S".repeat(20), 19).is_err());
    assert!(validate_ascii_field("scratch", "héllo", 64).is_err());
}

#[test]
fn test_error_categories() {
    assert_eq!(
        BnsError::validation("x").category(),
        ErrorCategory::Validation
    );
    assert_eq!(
        BnsError::InsufficientFunds { shortfall: 1 }.category(),
        ErrorCategory::Funding
    );
    assert_eq!(
        BnsError::missing("zonefile", "required").category().as_str(),
        "MissingParameter"
    );
    assert_eq!(
        BnsError::Signing("bad key".to_string()).user_message(),
        "The transaction could not be signed"
    );

    let remote = bns_common::error::remote_error("broadcast failed", Some(500), "oops");
    assert_eq!(remote.category(), ErrorCategory::RemoteService);
    assert!(remote.user_message().contains("500"));
}
