//! Core error types for timebank-core.
//!
//! This module defines the error hierarchy using thiserror. Balance
//! validation failures are ordinary, recoverable outcomes: the engine
//! reports them and leaves its state untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timebank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A command was rejected by the balance engine
    #[error(transparent)]
    Bank(#[from] BankError),

    /// Persistence store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejections produced by the balance engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Non-positive or non-numeric amount
    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    /// Subtraction exceeding the balance under the reject policy
    #[error("Insufficient balance: cannot subtract {requested} from {balance}")]
    InsufficientBalance { requested: u64, balance: u64 },

    /// Manual mutation or restart while a countdown owns the balance
    #[error("Countdown is active; stop it first")]
    CountdownActive,
}

impl BankError {
    pub fn invalid_amount(input: impl ToString) -> Self {
        BankError::InvalidAmount {
            input: input.to_string(),
        }
    }
}

/// Persistence store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Value could not be encoded for storage
    #[error("Failed to encode '{key}': {message}")]
    Encode { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
