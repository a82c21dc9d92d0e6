//! BNS Core
//!
//! Builds, funds and signs the Bitcoin transactions that carry naming
//! operations. A naming operation is encoded as an OP_RETURN payload of at
//! most 80 bytes, surrounded by the outputs the protocol expects (owner,
//! burn and change outputs), funded from a payer's UTXOs and signed by the
//! parties that control its inputs.
//!
//! # Modules
//!
//! - `payload`: Wire layout helpers and hashing
//! - `namespace`: Namespace pricing parameters
//! - `skeleton`: Unfunded transactions for each operation
//! - `signer`: Signing capabilities
//! - `signing`: Multi-party signing and serialization
//! - `backend`: External data sources and the broadcast endpoint
//! - `operations`: End-to-end builders and cost estimators

/// Payload encoding
pub mod payload;

/// Namespace descriptors
pub mod namespace;

/// Operation skeletons
pub mod skeleton;

/// Signers
pub mod signer;

/// Signing coordination
pub mod signing;

/// Backend collaborators
pub mod backend;

/// Transaction builders and estimators
pub mod operations;

pub use backend::{NamingBackend, NamingNetwork};
pub use namespace::NamespaceDescriptor;
pub use operations::TransactionBuilder;
pub use payload::Opcode;
pub use signer::{KeySigner, SignerInput, TransactionSigner};
pub use signing::{serialize_transaction, sign_inputs};
pub use skeleton::SkeletonEncoder;

pub use bns_common::{BnsError, BnsResult, TxConfig};
