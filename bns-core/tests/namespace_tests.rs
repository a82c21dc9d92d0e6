
use bns_common::error::BnsError;
use bns_core::namespace::{NamespaceDescriptor, FIXED_FIELDS_LENGTH};
use bns_core::payload::Opcode;
use bns_core::skeleton::SkeletonEncoder;
use test_utils::*;

fn configured(namespace_id: &str) -> NamespaceDescriptor {
    let mut namespace = NamespaceDescriptor::new(namespace_id).unwrap();
    namespace
        .set_version(1)
        .unwrap()
        .set_lifetime(52_595)
        .unwrap()
        .set_coeff(4)
        .unwrap()
        .set_base(4)
        .unwrap()
        .set_buckets(&[6, 5, 4, 3, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1])
        .unwrap()
        .set_nonalpha_discount(10)
        .unwrap()
        .set_no_vowel_discount(10)
        .unwrap();
    namespace
}

#[test]
fn test_reveal_payload_fields() {
    init_test_environment();

    let namespace = configured("hello");
    let reveal = p2pkh_address(6, NETWORK);
    let tx = SkeletonEncoder::new(NETWORK)
        .namespace_reveal(&namespace, &reveal)
        .unwrap();

    let payload = payload_of(&tx);
    assert_eq!(payload.len(), 20 + "hello".len());
    assert_eq!(&payload[..3], &[b'i', b'd', Opcode::NamespaceReveal.as_byte()]);

    // lifetime, coeff, base
    assert_eq!(&payload[3..7], &[0x00, 0x00, 0xcd, 0x73]);
    assert_eq!(payload[7], 4);
    assert_eq!(payload[8], 4);

    // bucket exponents, two per byte
    assert_eq!(
        &payload[9..17],
        &[0x65, 0x43, 0x21, 0x11, 0x11, 0x11, 0x11, 0x11]
    );
    assert_eq!(payload[17], 0xaa);
    assert_eq!(&payload[18..20], &[0x00, 0x01]);
    assert_eq!(&payload[20..], b"hello");

    assert_eq!(tx.output.len(), 2);
    assert_eq!(tx.output[1].script_pubkey, script_of(&reveal));
}

#[test]
fn test_payload_matches_descriptor() {
    init_test_environment();

    let namespace = configured("id");
    let fields = namespace.to_payload().unwrap();

    assert_eq!(fields.len(), FIXED_FIELDS_LENGTH + 2);
    assert_eq!(namespace.lifetime(), 52_595);
    assert_eq!(namespace.buckets()[0], 6);
    assert_eq!(namespace.nonalpha_discount(), 10);
}

#[test]
fn test_unconfigured_descriptor_fails_check() {
    init_test_environment();

    let namespace = NamespaceDescriptor::new("id").unwrap();
    assert!(matches!(namespace.check(), Err(BnsError::Validation(_))));
    assert!(namespace.to_payload().is_err());
}

#[test]
fn test_setters_reject_out_of_range_values() {
    init_test_environment();

    let mut namespace = configured("id");

    assert!(namespace.set_version(70_000).is_err());
    assert!(namespace.set_lifetime(u32::MAX as u64 + 1).is_err());
    assert!(namespace.set_coeff(256).is_err());
    assert!(namespace.set_base(300).is_err());
    assert!(namespace.set_buckets(&[1; 15]).is_err());
    assert!(namespace.set_buckets(&[16; 16]).is_err());
    assert!(namespace.set_nonalpha_discount(0).is_err());
    assert!(namespace.set_no_vowel_discount(16).is_err());

    // Rejected values leave the descriptor untouched
    assert_eq!(namespace, configured("id"));
    assert!(namespace.check().is_ok());
}

#[test]
fn test_invalid_namespace_ids() {
    init_test_environment();

    assert!(NamespaceDescriptor::new("").is_err());
    assert!(NamespaceDescriptor::new("has.dot").is_err());
    assert!(NamespaceDescriptor::new(&"a".repeat(20)).is_err());
    assert!(NamespaceDescriptor::new("ok-id_2").is_ok());
}
