//! BNS Common Library
//!
//! This crate provides the shared building blocks of the BNS transaction
//! engine: domain types, the byte-accurate size estimator, UTXO funding and
//! the local UTXO view that bridges the gap between a broadcast and the
//! chain indexer catching up.
//!
//! # Modules
//!
//! - `error`: The error type shared by every build stage
//! - `types`: Core domain types and protocol constants
//! - `validation`: Field validation used by payload encoders
//! - `math`: Transaction size and fee calculations
//! - `utxo_selection`: Greedy UTXO funding
//! - `utxo_management`: Local overlay of spent and created outputs
//! - `config`: Configuration management
//! - `logging`: Structured logging infrastructure
//!
//! Nothing in this crate touches key material; signing lives in `bns-core`.

/// Error handling
pub mod error;

/// Core domain types
pub mod types;

/// Input validation
pub mod validation;

/// Transaction size and fee math
pub mod math;

/// UTXO funding
pub mod utxo_selection;

/// UTXO set overlay
pub mod utxo_management;

/// Configuration management
pub mod config;

/// Logging functionality
pub mod logging;

pub use error::{BnsError, BnsResult, ErrorCategory};

pub use types::{
    NetworkKind, PriceQuote, PriceUnit, Utxo, CONSENSUS_HASH_LENGTH, DUST_MINIMUM,
    MAX_NAME_LENGTH, VALUE_HASH_LENGTH,
};

pub use math::{calculate_fee, estimate_tx_bytes, sum_output_values};

pub use utxo_selection::{fund, fund_transaction, Funded, FundingOutcome};

pub use utxo_management::UtxoSetView;

pub use config::TxConfig;

pub use bitcoin::{Address, Network, OutPoint, Transaction, Txid};
