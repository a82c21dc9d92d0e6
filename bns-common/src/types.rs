//! Common data types for BNS transaction construction
//!
//! These types describe the values that flow between the encoder, the
//! funding engine and the external collaborators: spendable outputs, price
//! quotes and the network a build targets. None of them carry key material.

use crate::error::{BnsError, BnsResult};
use bitcoin::{Network, OutPoint, Txid};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Constants for protocol and chain values

/// Smallest output value the transaction engine will create (satoshis)
pub const DUST_MINIMUM: u64 = 5500;

/// Magic marker at the start of every payload
pub const DEFAULT_MAGIC_BYTES: &str = "id";

/// Longest fully-qualified name a payload can carry
pub const MAX_NAME_LENGTH: usize = 37;

/// Longest namespace identifier
pub const MAX_NAMESPACE_ID_LENGTH: usize = 19;

/// Width of the token label / token type fields
pub const TOKEN_FIELD_LENGTH: usize = 19;

/// Width of a consensus hash in bytes
pub const CONSENSUS_HASH_LENGTH: usize = 16;

/// Width of a value hash (zone file hash, message hash) in bytes
pub const VALUE_HASH_LENGTH: usize = 20;

/// Unspent transaction output as reported by a UTXO provider
///
/// Serialized with the provider field names `tx_hash`, `tx_output_n`,
/// `value` and `confirmations`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    /// Reference to the transaction output (txid and vout)
    pub outpoint: OutPoint,

    /// Value in satoshis
    pub value: u64,

    /// Number of confirmations, if the provider reports it
    pub confirmations: Option<u32>,
}

impl Utxo {
    /// Create a new UTXO
    pub fn new(outpoint: OutPoint, value: u64, confirmations: Option<u32>) -> Self {
        Self {
            outpoint,
            value,
            confirmations,
        }
    }

    /// Create a UTXO from a hex transaction id and output index
    pub fn from_parts(tx_hash: &str, tx_output_n: u32, value: u64) -> BnsResult<Self> {
        let txid = Txid::from_str(tx_hash)
            .map_err(|e| BnsError::validation(format!("Invalid transaction id {}: {}", tx_hash, e)))?;
        Ok(Self::new(OutPoint::new(txid, tx_output_n), value, None))
    }

    /// Set the confirmation count
    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = Some(confirmations);
        self
    }

    /// Get a unique identifier for this UTXO
    pub fn id(&self) -> String {
        format!("{}:{}", self.outpoint.txid, self.outpoint.vout)
    }
}

impl Serialize for Utxo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Utxo", 4)?;
        state.serialize_field("tx_hash", &self.outpoint.txid.to_string())?;
        state.serialize_field("tx_output_n", &self.outpoint.vout)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("confirmations", &self.confirmations)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Utxo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct UtxoHelper {
            tx_hash: String,
            tx_output_n: u32,
            value: u64,
            #[serde(default)]
            confirmations: Option<u32>,
        }

        let helper = UtxoHelper::deserialize(deserializer)?;

        let txid = Txid::from_str(&helper.tx_hash)
            .map_err(|e| serde::de::Error::custom(format!("Invalid txid: {}", e)))?;

        Ok(Utxo {
            outpoint: OutPoint::new(txid, helper.tx_output_n),
            value: helper.value,
            confirmations: helper.confirmations,
        })
    }
}

/// Unit a price is denominated in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceUnit {
    /// The chain's native asset, burned to an output
    NativeAsset,
    /// An alternate token, burned inside the payload; carries its label
    Token(String),
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceUnit::NativeAsset => write!(f, "BTC"),
            PriceUnit::Token(label) => write!(f, "{}", label),
        }
    }
}

/// Price of a name or namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub unit: PriceUnit,
    pub amount: BigUint,
}

impl PriceQuote {
    /// Price in satoshis of the native asset
    pub fn native(amount: u64) -> Self {
        Self {
            unit: PriceUnit::NativeAsset,
            amount: BigUint::from(amount),
        }
    }

    /// Price in an alternate token
    pub fn token(label: impl Into<String>, amount: BigUint) -> Self {
        Self {
            unit: PriceUnit::Token(label.into()),
            amount,
        }
    }

    /// Whether the price is burned inside the payload rather than to an output
    pub fn is_token(&self) -> bool {
        matches!(self.unit, PriceUnit::Token(_))
    }

    /// The amount as a 64-bit integer, or a validation error if it cannot fit
    pub fn amount_u64(&self) -> BnsResult<u64> {
        self.amount.to_u64().ok_or_else(|| {
            BnsError::validation(format!(
                "price {} {} cannot fit into 8 bytes",
                self.amount, self.unit
            ))
        })
    }

    /// Value of the burn output that accompanies this price
    ///
    /// Native prices are burned to the output itself; token prices only need
    /// a dust-valued output.
    pub fn burn_output_value(&self, dust_minimum: u64) -> BnsResult<u64> {
        match self.unit {
            PriceUnit::NativeAsset => self.amount_u64(),
            PriceUnit::Token(_) => Ok(dust_minimum),
        }
    }
}

/// Chain a build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Mainnet,
    Testnet,
    Regtest,
}

impl NetworkKind {
    /// The matching `bitcoin` network
    pub fn to_bitcoin(self) -> Network {
        match self {
            NetworkKind::Mainnet => Network::Bitcoin,
            NetworkKind::Testnet => Network::Testnet,
            NetworkKind::Regtest => Network::Regtest,
        }
    }
}

impl FromStr for NetworkKind {
    type Err = BnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(NetworkKind::Mainnet),
            "testnet" => Ok(NetworkKind::Testnet),
            "regtest" => Ok(NetworkKind::Regtest),
            other => Err(BnsError::validation(format!("Unknown network: {}", other))),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Mainnet => write!(f, "mainnet"),
            NetworkKind::Testnet => write!(f, "testnet"),
            NetworkKind::Regtest => write!(f, "regtest"),
        }
    }
}

/// Determines if an amount is below the dust minimum
pub fn is_dust(amount_sats: u64, dust_minimum: u64) -> bool {
    amount_sats < dust_minimum
}
