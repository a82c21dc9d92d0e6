//! Transaction signers
//!
//! Inputs of one naming transaction are often controlled by different
//! parties: the owner of a name signs the input that proves ownership while
//! a payer funds the fees. Each party is represented by a
//! `TransactionSigner`, which knows its address and can sign one input of a
//! transaction in place.
//!
//! # Security Considerations
//!
//! - `KeySigner` keeps the secret key inside the `bitcoin` key types; raw key
//!   bytes only exist in zeroizing buffers while a key is parsed
//! - Key material is never logged and never included in error messages
//! - `Debug` output of a signer shows its address only

use async_trait::async_trait;
use bitcoin::blockdata::script::{Builder, PushBytesBuf};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Address, Network, PrivateKey, PublicKey, ScriptBuf, Transaction};
use bns_common::error::{BnsError, BnsResult};
use bns_common::logging::sanitize_for_logging;
use log::debug;
use std::fmt;
use zeroize::Zeroizing;

/// Hex length of a raw secret key
const RAW_KEY_HEX_LENGTH: usize = 64;

/// Suffix marking a hex key whose public key is compressed
const COMPRESSED_SUFFIX: &str = "01";

/// Something that can sign inputs of a transaction
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address whose outputs this signer can spend
    async fn address(&self) -> BnsResult<String>;

    /// Sign input `index` of `tx`, filling in its scriptSig or witness
    async fn sign_input(&self, tx: &mut Transaction, index: usize) -> BnsResult<()>;
}

/// Signer backed by a secp256k1 private key, spending P2PKH outputs
pub struct KeySigner {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: Address,
    secp: Secp256k1<All>,
}

impl fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySigner")
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

fn invalid_key(reason: &str) -> BnsError {
    BnsError::validation(format!("Invalid private key: {}", reason))
}

impl KeySigner {
    /// Signer for a key in hex (64 characters, or 66 ending in `01` for a
    /// compressed public key) or in WIF
    pub fn parse(key: &str, network: Network) -> BnsResult<Self> {
        let key = key.trim();
        let looks_hex = key.chars().all(|c| c.is_ascii_hexdigit());

        if looks_hex && (key.len() == RAW_KEY_HEX_LENGTH || key.len() == RAW_KEY_HEX_LENGTH + 2) {
            Self::from_hex(key, network)
        } else {
            Self::from_wif(key, network)
        }
    }

    /// Signer for a hex-encoded secret key
    pub fn from_hex(key_hex: &str, network: Network) -> BnsResult<Self> {
        let compressed = match key_hex.len() {
            RAW_KEY_HEX_LENGTH => false,
            len if len == RAW_KEY_HEX_LENGTH + 2 => {
                if !key_hex.ends_with(COMPRESSED_SUFFIX) {
                    return Err(invalid_key("a 66-character key must end in 01"));
                }
                true
            }
            _ => return Err(invalid_key("expected 64 or 66 hex characters")),
        };

        let bytes = Zeroizing::new(
            hex::decode(&key_hex[..RAW_KEY_HEX_LENGTH]).map_err(|_| invalid_key("not hex"))?,
        );
        let secret = SecretKey::from_slice(&bytes).map_err(|_| invalid_key("out of range"))?;

        let private_key = if compressed {
            PrivateKey::new(secret, network)
        } else {
            PrivateKey::new_uncompressed(secret, network)
        };

        Ok(Self::from_private_key(private_key, network))
    }

    /// Signer for a WIF-encoded key; addresses are derived for `network`
    pub fn from_wif(wif: &str, network: Network) -> BnsResult<Self> {
        let wif = Zeroizing::new(wif.to_string());
        let private_key = PrivateKey::from_wif(&wif).map_err(|_| invalid_key("not valid WIF"))?;
        Ok(Self::from_private_key(private_key, network))
    }

    pub fn from_private_key(private_key: PrivateKey, network: Network) -> Self {
        let secp = Secp256k1::new();
        let public_key = private_key.public_key(&secp);
        let address = Address::p2pkh(&public_key, network);

        KeySigner {
            private_key,
            public_key,
            address,
            secp,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn p2pkh_address(&self) -> &Address {
        &self.address
    }

    /// scriptSig spending a P2PKH output of this key at input `index`
    pub fn script_sig(&self, tx: &Transaction, index: usize) -> BnsResult<ScriptBuf> {
        if index >= tx.input.len() {
            return Err(BnsError::Signing(format!(
                "input index {} out of range (tx has {} inputs)",
                index,
                tx.input.len()
            )));
        }

        let script_code = ScriptBuf::new_p2pkh(&self.public_key.pubkey_hash());
        let sighash_type = EcdsaSighashType::All;

        let sighash = SighashCache::new(tx)
            .legacy_signature_hash(index, &script_code, sighash_type.to_u32())
            .map_err(|e| BnsError::Signing(format!("Failed to compute sighash: {}", e)))?;

        let message = Message::from_slice(&sighash.to_byte_array())
            .map_err(|e| BnsError::Signing(format!("Invalid sighash: {}", e)))?;
        let signature = self.secp.sign_ecdsa(&message, &self.private_key.inner);

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(sighash_type.to_u32() as u8);

        let sig_push = PushBytesBuf::try_from(sig_bytes)
            .map_err(|e| BnsError::Signing(format!("Signature cannot be pushed: {}", e)))?;

        Ok(Builder::new()
            .push_slice(sig_push)
            .push_key(&self.public_key)
            .into_script())
    }
}

#[async_trait]
impl TransactionSigner for KeySigner {
    async fn address(&self) -> BnsResult<String> {
        Ok(self.address.to_string())
    }

    async fn sign_input(&self, tx: &mut Transaction, index: usize) -> BnsResult<()> {
        let script_sig = self.script_sig(tx, index)?;
        tx.input[index].script_sig = script_sig;

        debug!(
            "Signed input {} with key for {}",
            index,
            sanitize_for_logging(&self.address.to_string())
        );
        Ok(())
    }
}

/// Either raw key material or an existing signer
#[derive(Clone, Copy)]
pub enum SignerInput<'a> {
    /// Private key in hex or WIF
    PrivateKeyHex(&'a str),
    /// An already-capable signer
    Signer(&'a dyn TransactionSigner),
}

impl fmt::Debug for SignerInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerInput::PrivateKeyHex(_) => write!(f, "SignerInput::PrivateKeyHex(..)"),
            SignerInput::Signer(_) => write!(f, "SignerInput::Signer(..)"),
        }
    }
}

impl<'a> SignerInput<'a> {
    /// Resolve into a signer, parsing key material for `network`
    pub fn into_signer(self, network: Network) -> BnsResult<ResolvedSigner<'a>> {
        match self {
            SignerInput::PrivateKeyHex(key) => Ok(ResolvedSigner::Key(KeySigner::parse(key, network)?)),
            SignerInput::Signer(signer) => Ok(ResolvedSigner::External(signer)),
        }
    }
}

impl<'a> From<&'a str> for SignerInput<'a> {
    fn from(key: &'a str) -> Self {
        SignerInput::PrivateKeyHex(key)
    }
}

impl<'a> From<&'a dyn TransactionSigner> for SignerInput<'a> {
    fn from(signer: &'a dyn TransactionSigner) -> Self {
        SignerInput::Signer(signer)
    }
}

/// A signer produced from a `SignerInput`
#[derive(Debug)]
pub enum ResolvedSigner<'a> {
    Key(KeySigner),
    External(&'a dyn TransactionSigner),
}

impl fmt::Debug for dyn TransactionSigner + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionSigner")
    }
}

#[async_trait]
impl TransactionSigner for ResolvedSigner<'_> {
    async fn address(&self) -> BnsResult<String> {
        match self {
            ResolvedSigner::Key(signer) => signer.address().await,
            ResolvedSigner::External(signer) => signer.address().await,
        }
    }

    async fn sign_input(&self, tx: &mut Transaction, index: usize) -> BnsResult<()> {
        match self {
            ResolvedSigner::Key(signer) => signer.sign_input(tx, index).await,
            ResolvedSigner::External(signer) => signer.sign_input(tx, index).await,
        }
    }
}
