//! Wire primitives of the naming protocol
//!
//! Every operation is carried by a null-data output whose data starts with
//! two magic bytes and a one-byte opcode. The remaining bytes sit at fixed
//! offsets counted from the start of the payload; multi-byte integers are
//! big-endian.
//!
//! ```text
//! 0      2  3
//! |------|--|-----------------------------------------|
//!  magic  op  operation fields (fixed offsets)
//! ```

use bitcoin::hashes::{hash160, sha256, Hash};
use bitcoin::blockdata::opcodes::all::OP_RETURN;
use bitcoin::blockdata::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::{Script, ScriptBuf};
use bns_common::error::{BnsError, BnsResult};
use bns_common::validation::{validate_b40, B40_ALPHABET};
use num_bigint::BigUint;
use std::fmt;

/// Largest payload relayed in a null-data output
pub const MAX_PAYLOAD_LENGTH: usize = 80;

/// Length of the magic bytes plus opcode
pub const HEADER_LENGTH: usize = 3;

/// Operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Preorder,
    Register,
    Update,
    Transfer,
    Revoke,
    NamespacePreorder,
    NamespaceReveal,
    NamespaceReady,
    NameImport,
    Announce,
    TokenTransfer,
}

impl Opcode {
    /// The byte written at offset 2
    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::Preorder => b'?',
            Opcode::Register => b':',
            Opcode::Update => b'+',
            Opcode::Transfer => b'>',
            Opcode::Revoke => b'~',
            Opcode::NamespacePreorder => b'*',
            Opcode::NamespaceReveal => b'&',
            Opcode::NamespaceReady => b'!',
            Opcode::NameImport => b';',
            Opcode::Announce => b'#',
            Opcode::TokenTransfer => b'$',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        let opcode = match byte {
            b'?' => Opcode::Preorder,
            b':' => Opcode::Register,
            b'+' => Opcode::Update,
            b'>' => Opcode::Transfer,
            b'~' => Opcode::Revoke,
            b'*' => Opcode::NamespacePreorder,
            b'&' => Opcode::NamespaceReveal,
            b'!' => Opcode::NamespaceReady,
            b';' => Opcode::NameImport,
            b'#' => Opcode::Announce,
            b'$' => Opcode::TokenTransfer,
            _ => return None,
        };
        Some(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// First 16 bytes of SHA256(data)
pub fn hash128(data: &[u8]) -> [u8; 16] {
    let digest = sha256::Hash::hash(data).to_byte_array();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

/// Read `value` as a base-40 integer and return its big-endian bytes
///
/// The result is at least one byte long, so the empty string and strings of
/// leading zero digits decode to `[0]`.
pub fn decode_b40(value: &str) -> BnsResult<Vec<u8>> {
    validate_b40(value)?;

    let base = BigUint::from(40u32);
    let number = value.chars().fold(BigUint::from(0u32), |acc, c| {
        let digit = B40_ALPHABET.find(c).unwrap_or(0) as u32;
        acc * &base + BigUint::from(digit)
    });

    Ok(number.to_bytes_be())
}

/// Zero-filled payload buffer with the header already written
#[derive(Debug, Clone)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    /// Allocate `length` bytes and write the magic bytes and opcode
    pub fn new(magic: [u8; 2], opcode: Opcode, length: usize) -> Self {
        let mut buf = vec![0u8; length.max(HEADER_LENGTH)];
        buf[..2].copy_from_slice(&magic);
        buf[2] = opcode.as_byte();
        PayloadWriter { buf }
    }

    /// A payload that is only the header plus `tail`
    pub fn with_tail(magic: [u8; 2], opcode: Opcode, tail: &[u8]) -> Self {
        let mut writer = Self::new(magic, opcode, HEADER_LENGTH);
        writer.buf.extend_from_slice(tail);
        writer
    }

    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Write `bytes` right-aligned in a `width`-byte field
    pub fn write_left_padded_at(&mut self, offset: usize, bytes: &[u8], width: usize) -> &mut Self {
        let start = offset + width - bytes.len();
        self.write_at(start, bytes)
    }

    pub fn write_u16_at(&mut self, offset: usize, value: u16) -> &mut Self {
        self.write_at(offset, &value.to_be_bytes())
    }

    pub fn write_u32_at(&mut self, offset: usize, value: u32) -> &mut Self {
        self.write_at(offset, &value.to_be_bytes())
    }

    pub fn write_u64_at(&mut self, offset: usize, value: u64) -> &mut Self {
        self.write_at(offset, &value.to_be_bytes())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Null-data script carrying `payload`
pub fn op_return_script(payload: &[u8]) -> BnsResult<ScriptBuf> {
    if payload.len() > MAX_PAYLOAD_LENGTH {
        return Err(BnsError::validation(format!(
            "payload of {} bytes exceeds the {}-byte null-data limit",
            payload.len(),
            MAX_PAYLOAD_LENGTH
        )));
    }

    let data = PushBytesBuf::try_from(payload.to_vec())
        .map_err(|e| BnsError::validation(format!("payload cannot be pushed: {}", e)))?;

    Ok(Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(data)
        .into_script())
}

/// Payload of a null-data script, if `script` is one
pub fn extract_payload(script: &Script) -> Option<Vec<u8>> {
    let mut instructions = script.instructions();

    match instructions.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return None,
    }

    match instructions.next() {
        Some(Ok(Instruction::PushBytes(bytes))) => Some(bytes.as_bytes().to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_b40_decoding() {
        assert_eq!(decode_b40("").unwrap(), vec![0]);
        assert_eq!(decode_b40("0").unwrap(), vec![0]);
        assert_eq!(decode_b40("a").unwrap(), vec![10]);
        // 'a' * 40 + 'b' = 10 * 40 + 11
        assert_eq!(decode_b40("ab").unwrap(), vec![0x01, 0x9b]);
        assert_eq!(decode_b40("+").unwrap(), vec![39]);
        assert!(decode_b40("A").is_err());
    }

    #[test]
    fn test_hashes() {
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
        assert_eq!(
            hex::encode(hash128(b"")),
            "e3b0c44298fc1c149afbf4c8996fb924"
        );
    }

    #[test]
    fn test_opcode_bytes() {
        for opcode in [
            Opcode::Preorder,
            Opcode::Register,
            Opcode::Update,
            Opcode::Transfer,
            Opcode::Revoke,
            Opcode::NamespacePreorder,
            Opcode::NamespaceReveal,
            Opcode::NamespaceReady,
            Opcode::NameImport,
            Opcode::Announce,
            Opcode::TokenTransfer,
        ] {
            assert_eq!(Opcode::from_byte(opcode.as_byte()), Some(opcode));
        }
        assert_eq!(Opcode::from_byte(b'x'), None);
    }

    #[test]
    fn test_payload_script() {
        let mut writer = PayloadWriter::new(*b"id", Opcode::Announce, 23);
        writer.write_at(3, &[0xff; 20]);
        let payload = writer.into_bytes();

        let script = op_return_script(&payload).unwrap();
        assert!(script.is_op_return());
        assert_eq!(extract_payload(&script), Some(payload));

        assert!(op_return_script(&[0u8; 81]).is_err());
        assert_eq!(op_return_script(&[0u8; 80]).unwrap().len(), 83);
    }

    #[test]
    fn test_padded_integer_fields() {
        let mut writer = PayloadWriter::new(*b"id", Opcode::TokenTransfer, 46);
        writer
            .write_left_padded_at(19, b"STACKS", 19)
            .write_u64_at(38, 0x0102);
        let payload = writer.into_bytes();

        assert_eq!(&payload[..3], b"id$");
        assert_eq!(&payload[19..32], &[0u8; 13]);
        assert_eq!(&payload[32..38], b"STACKS");
        assert_eq!(&payload[38..46], &[0, 0, 0, 0, 0, 0, 1, 2]);
    }
}
