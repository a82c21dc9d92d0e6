//! Unsigned transaction skeletons for every naming operation
//!
//! A skeleton is a version-1 transaction whose output 0 is the null-data
//! payload and whose remaining outputs are the dust-valued markers and
//! burns the operation requires. Inputs are added later by the funding
//! engine and the operation facade.
//!
//! Every encoder validates its inputs before writing a byte, so a malformed
//! name, hash, address or amount fails with `BnsError::Validation`.

use crate::namespace::NamespaceDescriptor;
use crate::payload::{
    decode_b40, hash128, hash160, op_return_script, Opcode, PayloadWriter, HEADER_LENGTH,
};
use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::{Address, Network, PubkeyHash, ScriptBuf, Transaction, TxOut};
use bns_common::config::TxConfig;
use bns_common::error::{BnsError, BnsResult};
use bns_common::logging::{log_encoding, log_params, LogLevel};
use bns_common::types::{
    PriceQuote, PriceUnit, CONSENSUS_HASH_LENGTH, DEFAULT_MAGIC_BYTES, DUST_MINIMUM,
    MAX_NAME_LENGTH, TOKEN_FIELD_LENGTH, VALUE_HASH_LENGTH,
};
use bns_common::validation::{
    decode_fixed_hex, parse_address, validate_ascii_field, validate_name, validate_namespace_id,
};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Offsets shared by several layouts
const HASH_OFFSET: usize = HEADER_LENGTH;
const PREORDER_CONSENSUS_OFFSET: usize = 23;
const PREORDER_BURN_OFFSET: usize = 39;
const PREORDER_LABEL_OFFSET: usize = 47;
const PREORDER_LENGTH: usize = 39;
const PREORDER_TOKEN_LENGTH: usize = 66;
const NAMESPACE_PREORDER_TOKEN_LENGTH: usize = 47;

const REGISTER_VALUE_HASH_OFFSET: usize = HEADER_LENGTH + MAX_NAME_LENGTH;
const REGISTER_BURN_OFFSET: usize = REGISTER_VALUE_HASH_OFFSET + VALUE_HASH_LENGTH;
const REGISTER_LENGTH: usize = REGISTER_BURN_OFFSET;
const REGISTER_TOKEN_LENGTH: usize = REGISTER_BURN_OFFSET + 8;

const UPDATE_VALUE_HASH_OFFSET: usize = 19;
const UPDATE_LENGTH: usize = 39;

const TRANSFER_NAME_HASH_OFFSET: usize = 4;
const TRANSFER_CONSENSUS_OFFSET: usize = 20;
const TRANSFER_LENGTH: usize = 36;

const TOKEN_TYPE_OFFSET: usize = 19;
const TOKEN_AMOUNT_OFFSET: usize = 38;
const TOKEN_SCRATCH_OFFSET: usize = 46;

/// Longest scratch area that keeps a token transfer inside a null-data output
pub const MAX_SCRATCH_AREA_LENGTH: usize = crate::payload::MAX_PAYLOAD_LENGTH - TOKEN_SCRATCH_OFFSET;

/// Transfer marker for keeping the zone file
pub const KEEP_ZONEFILE: u8 = b'>';

/// Transfer marker for dropping the zone file
pub const DROP_ZONEFILE: u8 = b'~';

/// Builds operation skeletons for one network and magic marker
#[derive(Debug, Clone)]
pub struct SkeletonEncoder {
    network: Network,
    magic: [u8; 2],
    dust_minimum: u64,
}

fn u64_field(field: &str, amount: &BigUint) -> BnsResult<u64> {
    amount.to_u64().ok_or_else(|| {
        BnsError::validation(format!("{} {} cannot fit into 8 bytes", field, amount))
    })
}

impl SkeletonEncoder {
    /// Encoder with the default magic bytes and dust minimum
    pub fn new(network: Network) -> Self {
        let magic = DEFAULT_MAGIC_BYTES.as_bytes();
        SkeletonEncoder {
            network,
            magic: [magic[0], magic[1]],
            dust_minimum: DUST_MINIMUM,
        }
    }

    /// Encoder for the network, magic bytes and dust policy of `config`
    pub fn from_config(config: &TxConfig) -> BnsResult<Self> {
        Ok(SkeletonEncoder {
            network: config.bitcoin_network()?,
            magic: config.magic_bytes()?,
            dust_minimum: config.dust_minimum(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn dust_minimum(&self) -> u64 {
        self.dust_minimum
    }

    fn address(&self, address: &str) -> BnsResult<Address> {
        parse_address(address, self.network)
    }

    fn consensus_hash(consensus_hash: &str) -> BnsResult<[u8; CONSENSUS_HASH_LENGTH]> {
        decode_fixed_hex("consensus hash", consensus_hash)
    }

    fn value_hash(field: &str, value_hash: &str) -> BnsResult<[u8; VALUE_HASH_LENGTH]> {
        decode_fixed_hex(field, value_hash)
    }

    fn skeleton(&self, opcode: Opcode, payload: Vec<u8>) -> BnsResult<Transaction> {
        log_encoding(
            LogLevel::Trace,
            "Encoded payload",
            Some(log_params(vec![
                ("opcode", opcode.to_string()),
                ("payload", hex::encode(&payload)),
            ])),
        );

        Ok(Transaction {
            version: 1,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![TxOut {
                value: 0,
                script_pubkey: op_return_script(&payload)?,
            }],
        })
    }

    fn pay(tx: &mut Transaction, script_pubkey: ScriptBuf, value: u64) {
        tx.output.push(TxOut {
            value,
            script_pubkey,
        });
    }

    /// Preorder a name
    ///
    /// Outputs: payload, preorder address (dust, receives change), burn
    /// address (the price for native prices, dust for token prices).
    pub fn preorder(
        &self,
        name: &str,
        consensus_hash: &str,
        preorder_address: &str,
        burn_address: &str,
        price: &PriceQuote,
        register_address: &str,
    ) -> BnsResult<Transaction> {
        validate_name(name)?;
        let consensus = Self::consensus_hash(consensus_hash)?;
        let preorder = self.address(preorder_address)?;
        let burn = self.address(burn_address)?;
        self.address(register_address)?;

        let mut data = decode_b40(name)?;
        data.extend_from_slice(preorder.script_pubkey().as_bytes());
        data.extend_from_slice(register_address.as_bytes());

        let payload = match &price.unit {
            PriceUnit::NativeAsset => {
                let mut writer = PayloadWriter::new(self.magic, Opcode::Preorder, PREORDER_LENGTH);
                writer
                    .write_at(HASH_OFFSET, &hash160(&data))
                    .write_at(PREORDER_CONSENSUS_OFFSET, &consensus);
                writer.into_bytes()
            }
            PriceUnit::Token(label) => {
                validate_ascii_field("token label", label, TOKEN_FIELD_LENGTH)?;
                let burn_amount = u64_field("burn amount", &price.amount)?;

                let mut writer =
                    PayloadWriter::new(self.magic, Opcode::Preorder, PREORDER_TOKEN_LENGTH);
                writer
                    .write_at(HASH_OFFSET, &hash160(&data))
                    .write_at(PREORDER_CONSENSUS_OFFSET, &consensus)
                    .write_u64_at(PREORDER_BURN_OFFSET, burn_amount)
                    .write_at(PREORDER_LABEL_OFFSET, label.as_bytes());
                writer.into_bytes()
            }
        };

        let mut tx = self.skeleton(Opcode::Preorder, payload)?;
        Self::pay(&mut tx, preorder.script_pubkey(), self.dust_minimum);
        Self::pay(&mut tx, burn.script_pubkey(), price.burn_output_value(self.dust_minimum)?);
        Ok(tx)
    }

    fn register_payload(
        &self,
        name: &str,
        value_hash: Option<&str>,
        burn_token_amount: Option<u64>,
    ) -> BnsResult<Vec<u8>> {
        validate_name(name)?;

        let value_hash = match value_hash {
            Some(hash) => Some(Self::value_hash("value hash", hash)?),
            None if burn_token_amount.is_some() => Some([0u8; VALUE_HASH_LENGTH]),
            None => None,
        };

        let payload = match (value_hash, burn_token_amount) {
            (None, _) => PayloadWriter::with_tail(self.magic, Opcode::Register, name.as_bytes())
                .into_bytes(),
            (Some(hash), burn) => {
                let length = if burn.is_some() {
                    REGISTER_TOKEN_LENGTH
                } else {
                    REGISTER_LENGTH
                };

                let mut writer = PayloadWriter::new(self.magic, Opcode::Register, length);
                writer
                    .write_at(HEADER_LENGTH, name.as_bytes())
                    .write_at(REGISTER_VALUE_HASH_OFFSET, &hash);
                if let Some(amount) = burn {
                    writer.write_u64_at(REGISTER_BURN_OFFSET, amount);
                }
                writer.into_bytes()
            }
        };

        Ok(payload)
    }

    /// Register a preordered name
    ///
    /// With no value hash the payload is the bare name; with a value hash
    /// the name is zero-padded to 37 bytes and the hash follows it. A token
    /// burn amount forces the padded layout and is written after the hash.
    pub fn register(
        &self,
        name: &str,
        owner_address: &str,
        value_hash: Option<&str>,
        burn_token_amount: Option<u64>,
    ) -> BnsResult<Transaction> {
        let owner = self.address(owner_address)?;
        let payload = self.register_payload(name, value_hash, burn_token_amount)?;

        let mut tx = self.skeleton(Opcode::Register, payload)?;
        Self::pay(&mut tx, owner.script_pubkey(), self.dust_minimum);
        Ok(tx)
    }

    /// Renew a name, optionally moving it to a new owner
    ///
    /// Outputs: payload, next owner (dust), last owner (dust), burn address
    /// (the price for native prices, dust for token prices). Token prices
    /// are burned inside the payload.
    pub fn renewal(
        &self,
        name: &str,
        next_owner_address: &str,
        last_owner_address: &str,
        burn_address: &str,
        price: &PriceQuote,
        value_hash: Option<&str>,
    ) -> BnsResult<Transaction> {
        let last_owner = self.address(last_owner_address)?;
        let burn = self.address(burn_address)?;

        let burn_token_amount = match price.unit {
            PriceUnit::NativeAsset => None,
            PriceUnit::Token(_) => Some(u64_field("burn amount", &price.amount)?),
        };

        let mut tx = self.register(name, next_owner_address, value_hash, burn_token_amount)?;
        Self::pay(&mut tx, last_owner.script_pubkey(), self.dust_minimum);
        Self::pay(&mut tx, burn.script_pubkey(), price.burn_output_value(self.dust_minimum)?);
        Ok(tx)
    }

    /// Update the value hash of a name; the owner input is added by the caller
    pub fn update(&self, name: &str, consensus_hash: &str, value_hash: &str) -> BnsResult<Transaction> {
        validate_name(name)?;
        Self::consensus_hash(consensus_hash)?;
        let value_hash = Self::value_hash("value hash", value_hash)?;

        // The consensus hash is mixed in as its hex text
        let mut data = name.as_bytes().to_vec();
        data.extend_from_slice(consensus_hash.as_bytes());

        let mut writer = PayloadWriter::new(self.magic, Opcode::Update, UPDATE_LENGTH);
        writer
            .write_at(HASH_OFFSET, &hash128(&data))
            .write_at(UPDATE_VALUE_HASH_OFFSET, &value_hash);

        self.skeleton(Opcode::Update, writer.into_bytes())
    }

    /// Transfer a name to a new owner
    pub fn transfer(
        &self,
        name: &str,
        consensus_hash: &str,
        new_owner_address: &str,
        keep_zonefile: bool,
    ) -> BnsResult<Transaction> {
        validate_name(name)?;
        let consensus = Self::consensus_hash(consensus_hash)?;
        let new_owner = self.address(new_owner_address)?;

        let keep = if keep_zonefile { KEEP_ZONEFILE } else { DROP_ZONEFILE };

        let mut writer = PayloadWriter::new(self.magic, Opcode::Transfer, TRANSFER_LENGTH);
        writer
            .write_at(HEADER_LENGTH, &[keep])
            .write_at(TRANSFER_NAME_HASH_OFFSET, &hash128(name.as_bytes()))
            .write_at(TRANSFER_CONSENSUS_OFFSET, &consensus);

        let mut tx = self.skeleton(Opcode::Transfer, writer.into_bytes())?;
        Self::pay(&mut tx, new_owner.script_pubkey(), self.dust_minimum);
        Ok(tx)
    }

    /// Revoke a name
    pub fn revoke(&self, name: &str) -> BnsResult<Transaction> {
        validate_name(name)?;
        let payload = PayloadWriter::with_tail(self.magic, Opcode::Revoke, name.as_bytes());
        self.skeleton(Opcode::Revoke, payload.into_bytes())
    }

    /// Preorder a namespace
    ///
    /// Outputs: payload, preorder address (dust, receives change), burn
    /// address (the price for native prices, dust for token prices).
    pub fn namespace_preorder(
        &self,
        namespace_id: &str,
        consensus_hash: &str,
        preorder_address: &str,
        reveal_address: &str,
        burn_address: &str,
        price: &PriceQuote,
    ) -> BnsResult<Transaction> {
        validate_namespace_id(namespace_id)?;
        let consensus = Self::consensus_hash(consensus_hash)?;
        let preorder = self.address(preorder_address)?;
        let burn = self.address(burn_address)?;
        self.address(reveal_address)?;

        let mut data = decode_b40(namespace_id)?;
        data.extend_from_slice(preorder.script_pubkey().as_bytes());
        data.extend_from_slice(reveal_address.as_bytes());

        let length = if price.is_token() {
            NAMESPACE_PREORDER_TOKEN_LENGTH
        } else {
            PREORDER_LENGTH
        };

        let mut writer = PayloadWriter::new(self.magic, Opcode::NamespacePreorder, length);
        writer
            .write_at(HASH_OFFSET, &hash160(&data))
            .write_at(PREORDER_CONSENSUS_OFFSET, &consensus);
        if price.is_token() {
            writer.write_u64_at(PREORDER_BURN_OFFSET, u64_field("burn amount", &price.amount)?);
        }

        let mut tx = self.skeleton(Opcode::NamespacePreorder, writer.into_bytes())?;
        Self::pay(&mut tx, preorder.script_pubkey(), self.dust_minimum);
        Self::pay(&mut tx, burn.script_pubkey(), price.burn_output_value(self.dust_minimum)?);
        Ok(tx)
    }

    /// Reveal a preordered namespace
    pub fn namespace_reveal(
        &self,
        namespace: &NamespaceDescriptor,
        reveal_address: &str,
    ) -> BnsResult<Transaction> {
        let reveal = self.address(reveal_address)?;
        let fields = namespace.to_payload()?;
        let payload = PayloadWriter::with_tail(self.magic, Opcode::NamespaceReveal, &fields);

        let mut tx = self.skeleton(Opcode::NamespaceReveal, payload.into_bytes())?;
        Self::pay(&mut tx, reveal.script_pubkey(), self.dust_minimum);
        Ok(tx)
    }

    /// Launch a revealed namespace
    pub fn namespace_ready(&self, namespace_id: &str) -> BnsResult<Transaction> {
        validate_namespace_id(namespace_id)?;

        let tail = format!(".{}", namespace_id);
        let payload = PayloadWriter::with_tail(self.magic, Opcode::NamespaceReady, tail.as_bytes());
        self.skeleton(Opcode::NamespaceReady, payload.into_bytes())
    }

    /// Import a name into a revealed namespace
    ///
    /// The zone file hash is published as a P2PKH output whose key hash is
    /// the zone file hash itself.
    pub fn name_import(
        &self,
        name: &str,
        recipient_address: &str,
        zonefile_hash: &str,
    ) -> BnsResult<Transaction> {
        validate_name(name)?;
        let recipient = self.address(recipient_address)?;
        let zonefile_hash = Self::value_hash("zone file hash", zonefile_hash)?;

        let payload = PayloadWriter::with_tail(self.magic, Opcode::NameImport, name.as_bytes());

        let mut tx = self.skeleton(Opcode::NameImport, payload.into_bytes())?;
        Self::pay(&mut tx, recipient.script_pubkey(), self.dust_minimum);
        Self::pay(
            &mut tx,
            ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(zonefile_hash)),
            self.dust_minimum,
        );
        Ok(tx)
    }

    /// Announce a message by its hash
    pub fn announce(&self, message_hash: &str) -> BnsResult<Transaction> {
        let message_hash = Self::value_hash("message hash", message_hash)?;
        let payload = PayloadWriter::with_tail(self.magic, Opcode::Announce, &message_hash);
        self.skeleton(Opcode::Announce, payload.into_bytes())
    }

    /// Transfer tokens to a recipient
    ///
    /// The token type is right-aligned in its 19-byte field; the scratch
    /// area fills the rest of the payload.
    pub fn token_transfer(
        &self,
        recipient_address: &str,
        consensus_hash: &str,
        token_type: &str,
        token_amount: &BigUint,
        scratch_area: &str,
    ) -> BnsResult<Transaction> {
        let recipient = self.address(recipient_address)?;
        let consensus = Self::consensus_hash(consensus_hash)?;
        validate_ascii_field("token type", token_type, TOKEN_FIELD_LENGTH)?;
        validate_ascii_field("scratch area", scratch_area, MAX_SCRATCH_AREA_LENGTH)?;
        let amount = u64_field("token amount", token_amount)?;

        let mut writer = PayloadWriter::new(
            self.magic,
            Opcode::TokenTransfer,
            TOKEN_SCRATCH_OFFSET + scratch_area.len(),
        );
        writer
            .write_at(HEADER_LENGTH, &consensus)
            .write_left_padded_at(TOKEN_TYPE_OFFSET, token_type.as_bytes(), TOKEN_FIELD_LENGTH)
            .write_u64_at(TOKEN_AMOUNT_OFFSET, amount)
            .write_at(TOKEN_SCRATCH_OFFSET, scratch_area.as_bytes());

        let mut tx = self.skeleton(Opcode::TokenTransfer, writer.into_bytes())?;
        Self::pay(&mut tx, recipient.script_pubkey(), self.dust_minimum);
        Ok(tx)
    }
}
