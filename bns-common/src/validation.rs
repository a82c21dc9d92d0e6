//! Input validation for payload encoders
//!
//! Every encoder validates its semantic inputs before a single byte is
//! written, so malformed input surfaces as a `Validation` error before any
//! I/O is issued. The helpers here cover the field kinds that recur across
//! operations: fixed-width hex hashes, names, namespace identifiers and
//! addresses.

use crate::error::{BnsError, BnsResult};
use crate::types::{MAX_NAMESPACE_ID_LENGTH, MAX_NAME_LENGTH};
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network};
use std::str::FromStr;

/// Alphabet of the base-40 name encoding
pub const B40_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz-_.+";

/// Characters allowed in a namespace identifier
const NAMESPACE_ID_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz-_";

/// Decode a hex string that must be exactly `N` bytes long
///
/// # Arguments
/// * `field` - Field name used in the error message
/// * `value` - Hex-encoded value
pub fn decode_fixed_hex<const N: usize>(field: &str, value: &str) -> BnsResult<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|e| BnsError::validation(format!("{} is not valid hex: {}", field, e)))?;

    if bytes.len() != N {
        return Err(BnsError::validation(format!(
            "{} length incorrect: expected {} bytes, hex-encoded, got {}",
            field,
            N,
            bytes.len()
        )));
    }

    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Validate a fully-qualified name (`name.namespace`)
pub fn validate_name(name: &str) -> BnsResult<()> {
    if name.is_empty() {
        return Err(BnsError::validation("name must not be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(BnsError::validation(format!(
            "name '{}' is longer than {} bytes",
            name, MAX_NAME_LENGTH
        )));
    }

    validate_b40(name)
}

/// Check that every character belongs to the base-40 alphabet
pub fn validate_b40(value: &str) -> BnsResult<()> {
    match value.chars().find(|c| !B40_ALPHABET.contains(*c)) {
        Some(c) => Err(BnsError::validation(format!(
            "'{}' contains character '{}' outside the base-40 alphabet",
            value, c
        ))),
        None => Ok(()),
    }
}

/// Validate a namespace identifier
pub fn validate_namespace_id(namespace_id: &str) -> BnsResult<()> {
    if namespace_id.is_empty() {
        return Err(BnsError::validation("namespace ID must not be empty"));
    }

    if namespace_id.len() > MAX_NAMESPACE_ID_LENGTH {
        return Err(BnsError::validation(format!(
            "namespace ID too long ({} chars max)",
            MAX_NAMESPACE_ID_LENGTH
        )));
    }

    if !namespace_id.chars().all(|c| NAMESPACE_ID_ALPHABET.contains(c)) {
        return Err(BnsError::validation(format!(
            "namespace ID can only use characters {}",
            NAMESPACE_ID_ALPHABET
        )));
    }

    Ok(())
}

/// The namespace a fully-qualified name belongs to
pub fn namespace_of(name: &str) -> BnsResult<&str> {
    match name.rsplit_once('.') {
        Some((label, namespace)) if !label.is_empty() && !namespace.is_empty() => Ok(namespace),
        _ => Err(BnsError::validation(format!(
            "'{}' is not a fully-qualified name",
            name
        ))),
    }
}

/// Parse an address and check it belongs to the expected network
pub fn parse_address(address: &str, network: Network) -> BnsResult<Address> {
    let unchecked = Address::<NetworkUnchecked>::from_str(address)
        .map_err(|e| BnsError::validation(format!("Invalid address {}: {}", address, e)))?;

    unchecked.require_network(network).map_err(|e| {
        BnsError::validation(format!(
            "Address {} does not belong to {}: {}",
            address, network, e
        ))
    })
}

/// Validate an ASCII field that is written into a fixed-width slot
pub fn validate_ascii_field(field: &str, value: &str, max_len: usize) -> BnsResult<()> {
    if !value.is_ascii() {
        return Err(BnsError::validation(format!("{} must be ASCII", field)));
    }

    if value.len() > max_len {
        return Err(BnsError::validation(format!(
            "{} '{}' is longer than {} bytes",
            field, value, max_len
        )));
    }

    Ok(())
}
