//! Standardized error handling for BNS transaction construction
//!
//! This module defines the single error type shared by every stage of a
//! transaction build: payload encoding, funding, signing and the calls made
//! to external collaborators. Errors are never retried internally; they
//! propagate to the caller untouched.
//!
//! # Categories
//!
//! - `Validation`: malformed encoder input, raised before any I/O happens
//! - `InsufficientFunds`: the funding engine ran out of UTXOs
//! - `RemoteService`: a collaborator returned a non-success response
//! - `MissingParameter`: a required argument was omitted
//!
//! # Usage
//!
//! ```
//! use bns_common::error::{BnsError, BnsResult};
//!
//! fn check_hash(hash: &[u8]) -> BnsResult<()> {
//!     if hash.len() != 20 {
//!         return Err(BnsError::validation("value hash must be 20 bytes"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_hash(&[0u8; 20]).is_ok());
//! assert!(check_hash(&[0u8; 4]).is_err());
//! ```

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// The main error type for BNS transaction construction
#[derive(Debug, Error)]
pub enum BnsError {
    /// Encoder input that cannot be represented on the wire
    #[error("Validation error: {0}")]
    Validation(String),

    /// The funding engine exhausted the available UTXOs
    #[error("Insufficient funds: {shortfall} satoshis left to fund")]
    InsufficientFunds { shortfall: u64 },

    /// A spend whose destination output would be dust once fees are paid
    #[error("Invalid amount: fees of {fees} satoshis exceed the usable part of {amount} satoshis")]
    InvalidAmount { fees: u64, amount: u64 },

    /// An external collaborator answered with a non-success response
    #[error("Remote service error: {context}")]
    RemoteService {
        context: String,
        status: Option<u16>,
        body: String,
    },

    /// A required low-level argument was omitted
    #[error("Missing parameter '{parameter}': {reason}")]
    MissingParameter { parameter: String, reason: String },

    /// Signing failed or left the transaction incomplete
    #[error("Signing error: {0}")]
    Signing(String),

    /// Hex or consensus decoding errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {context}")]
    Config {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// I/O errors
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Type alias for a Result with BnsError
pub type BnsResult<T> = Result<T, BnsError>;

impl From<io::Error> for BnsError {
    fn from(err: io::Error) -> Self {
        BnsError::Io {
            context: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BnsError {
    fn from(err: serde_json::Error) -> Self {
        BnsError::Serialization {
            context: format!("JSON serialization error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for BnsError {
    fn from(err: toml::de::Error) -> Self {
        BnsError::Config {
            context: format!("TOML deserialization error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for BnsError {
    fn from(err: toml::ser::Error) -> Self {
        BnsError::Config {
            context: format!("TOML serialization error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<hex::FromHexError> for BnsError {
    fn from(err: hex::FromHexError) -> Self {
        BnsError::Serialization {
            context: format!("Hex decoding error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<bitcoin::consensus::encode::Error> for BnsError {
    fn from(err: bitcoin::consensus::encode::Error) -> Self {
        BnsError::Serialization {
            context: format!("Bitcoin serialization error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<bitcoin::address::Error> for BnsError {
    fn from(err: bitcoin::address::Error) -> Self {
        BnsError::Validation(format!("Invalid Bitcoin address: {}", err))
    }
}

/// Create a new configuration error with context
pub fn config_error<S: Into<String>>(context: S) -> BnsError {
    BnsError::Config {
        context: context.into(),
        source: None,
    }
}

/// Create a remote service error from a collaborator response
pub fn remote_error<S: Into<String>>(context: S, status: Option<u16>, body: impl Into<String>) -> BnsError {
    BnsError::RemoteService {
        context: context.into(),
        status,
        body: body.into(),
    }
}

/// Error category for logging purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Funding,
    RemoteService,
    MissingParameter,
    Signing,
    Serialization,
    Config,
    Io,
}

impl ErrorCategory {
    /// Convert the error category to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Funding => "Funding",
            ErrorCategory::RemoteService => "RemoteService",
            ErrorCategory::MissingParameter => "MissingParameter",
            ErrorCategory::Signing => "Signing",
            ErrorCategory::Serialization => "Serialization",
            ErrorCategory::Config => "Config",
            ErrorCategory::Io => "Io",
        }
    }
}

impl BnsError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        BnsError::Validation(message.into())
    }

    /// Create a new missing-parameter error
    pub fn missing<P: Into<String>, R: Into<String>>(parameter: P, reason: R) -> Self {
        BnsError::MissingParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Get the category of this error for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            BnsError::Validation(_) => ErrorCategory::Validation,
            BnsError::InsufficientFunds { .. } | BnsError::InvalidAmount { .. } => {
                ErrorCategory::Funding
            }
            BnsError::RemoteService { .. } => ErrorCategory::RemoteService,
            BnsError::MissingParameter { .. } => ErrorCategory::MissingParameter,
            BnsError::Signing(_) => ErrorCategory::Signing,
            BnsError::Serialization { .. } => ErrorCategory::Serialization,
            BnsError::Config { .. } => ErrorCategory::Config,
            BnsError::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Get a message suitable for displaying to users
    ///
    /// Signing failures are reported without detail, since their source
    /// errors may reference key handling.
    pub fn user_message(&self) -> String {
        match self {
            BnsError::Signing(_) => "The transaction could not be signed".to_string(),
            BnsError::RemoteService { context, status, .. } => match status {
                Some(code) => format!("External service error ({}): {}", code, context),
                None => format!("External service error: {}", context),
            },
            BnsError::Io { context, .. } => format!("File operation error: {}", context),
            BnsError::Serialization { context, .. } => format!("Data format error: {}", context),
            other => other.to_string(),
        }
    }
}
