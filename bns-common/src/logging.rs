//! Logging infrastructure for transaction construction
//!
//! Structured logging on top of the `log` facade and `env_logger`:
//! - Never logs key material
//! - Truncates addresses, transaction ids and hex payloads before they are logged
//! - Tags events by the build stage that produced them
//! - Human-readable or JSON-lines output
//!
//! # Usage
//!
//! ```
//! use bns_common::logging::{self, LogConfig, LogLevel};
//! use serde_json::json;
//!
//! logging::init(&LogConfig::default()).expect("Failed to initialize logging");
//!
//! logging::log_funding(
//!     LogLevel::Debug,
//!     "funded preorder",
//!     Some(json!({ "inputs": 2 })),
//! );
//! ```

use crate::error::{config_error, BnsResult};
use chrono::Local;
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write as IoWrite;
use std::sync::Once;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Build stage an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogContext {
    /// Payload and skeleton encoding
    Encoding,
    /// UTXO selection and change computation
    Funding,
    /// Input signing and serialization
    Signing,
    /// Calls to the naming backend, broadcasts
    Network,
    /// Finished transactions
    Transaction,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level that is emitted
    pub level: LogLevel,
    /// Path to log file (None for console-only)
    pub log_file: Option<String>,
    /// Whether to include timestamps in log messages
    pub include_timestamps: bool,
    /// Whether to include source location in log messages
    pub include_source_location: bool,
    /// Whether to use JSON format for logs (machine-readable)
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_file: None,
            include_timestamps: true,
            include_source_location: false,
            json_format: false,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

static LOGGING_INIT: Once = Once::new();

/// Initialize the logging system with the given configuration
///
/// Only the first call installs a logger. Later calls return `Ok(())`, as
/// does a first call that finds another logger already installed.
///
/// # Arguments
/// * `config` - Configuration for the logging system
pub fn init(config: &LogConfig) -> BnsResult<()> {
    let mut result = Ok(());

    let include_timestamps = config.include_timestamps;
    let include_source_location = config.include_source_location;
    let json_format = config.json_format;
    let log_file = config.log_file.clone();
    let level = config.level;

    LOGGING_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level.into());

        builder.format(move |buf, record| {
            let timestamp = if include_timestamps {
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            } else {
                String::new()
            };

            let source_location = if include_source_location {
                format!(
                    " [{}:{}]",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0)
                )
            } else {
                String::new()
            };

            if json_format {
                let line = json!({
                    "timestamp": timestamp,
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "location": source_location.trim(),
                    "message": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            } else {
                if include_timestamps {
                    write!(buf, "{} ", timestamp)?;
                }
                writeln!(buf, "[{}{}] {}", record.level(), source_location, record.args())
            }
        });

        if let Some(file_path) = &log_file {
            match OpenOptions::new().create(true).append(true).open(file_path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => {
                    result = Err(config_error(format!(
                        "Failed to open log file {}: {}",
                        file_path, e
                    )));
                    return;
                }
            }
        }

        if builder.try_init().is_err() {
            // Another logger (usually a test harness) got there first
            debug!("Logger already initialized, using existing instance");
        }
    });

    result
}

/// Truncate a value that identifies coins or parties before logging it
///
/// Keeps the first and last four characters of longer values and masks
/// short values entirely.
pub fn sanitize_for_logging(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "*****".to_string();
    }

    let first: String = chars[..4].iter().collect();
    let last: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", first, last)
}

/// Parameters that identify coins or parties
const SENSITIVE_PARAMS: &[&str] = &["address", "payer", "owner", "txid", "payload"];

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_PARAMS.contains(&key) || key.ends_with("_address")
}

/// Truncate the sensitive string values of a parameter object
///
/// Counts, rates and opcodes are left readable.
pub fn sanitize_params(params: serde_json::Value) -> serde_json::Value {
    match params {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let sanitized = match value {
                        serde_json::Value::String(s) if is_sensitive(&key) => {
                            json!(sanitize_for_logging(&s))
                        }
                        other => other,
                    };
                    (key, sanitized)
                })
                .collect(),
        ),
        other => other,
    }
}

fn log_with_context(
    level: LogLevel,
    context: LogContext,
    message: &str,
    params: Option<serde_json::Value>,
) {
    match params.map(sanitize_params) {
        Some(params) => log::log!(level.into(), "[{:?}] {} {}", context, message, params),
        None => log::log!(level.into(), "[{:?}] {}", context, message),
    }
}

/// Log an encoding event
pub fn log_encoding(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_with_context(level, LogContext::Encoding, message, params);
}

/// Log a funding decision
pub fn log_funding(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_with_context(level, LogContext::Funding, message, params);
}

/// Log a signing event
pub fn log_signing(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_with_context(level, LogContext::Signing, message, params);
}

/// Log a backend call or broadcast
pub fn log_network(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_with_context(level, LogContext::Network, message, params);
}

/// Log a finished transaction
pub fn log_transaction(level: LogLevel, message: &str, params: Option<serde_json::Value>) {
    log_with_context(level, LogContext::Transaction, message, params);
}

/// Build a parameter map for the `log_*` helpers
///
/// String values are sanitized when the event is logged.
pub fn log_params(params: Vec<(&str, String)>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, value) in params {
        map.insert(name.to_string(), serde_json::Value::String(value));
    }
    serde_json::Value::Object(map)
}
