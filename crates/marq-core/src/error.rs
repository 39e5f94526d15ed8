//! Error types for tapestry operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

use crate::schema::SchemaViolation;

/// Result type alias for tapestry operations.
pub type Result<T> = std::result::Result<T, TapestryError>;

/// Core error type for tapestry operations.
#[derive(Debug, Error)]
pub enum TapestryError {
    /// Operation attempted while the tapestry is locked
    #[error("Tapestry is locked; unlock it before reading or writing threads")]
    Locked,

    /// Operation attempted before `initialize()` completed
    #[error("Tapestry has not been initialized")]
    NotInitialized,

    /// Stored or supplied envelope does not carry the expected tag
    #[error("Invalid encrypted envelope format")]
    InvalidEnvelope,

    /// Wrong password, corrupted ciphertext, or tampered envelope.
    ///
    /// Deliberately undifferentiated.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Encryption or key derivation error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Scroll import rejected
    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Reasons a scroll import is rejected.
///
/// Each variant names one rule category so callers can give actionable
/// feedback. The live tapestry is never modified when one of these is raised.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("scroll is {size} bytes, limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("scroll is not valid JSON: {0}")]
    Malformed(String),

    #[error("scroll must be a JSON array of threads")]
    NotAnArray,

    #[error("scroll holds {count} threads, limit is {max}")]
    TooManyThreads { count: usize, max: usize },

    #[error("thread {index} failed schema validation: {violation}")]
    Schema {
        index: usize,
        violation: SchemaViolation,
    },

    #[error("hash chain is broken at thread {index}")]
    BrokenChain { index: usize },
}

impl From<std::io::Error> for TapestryError {
    fn from(err: std::io::Error) -> Self {
        TapestryError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for TapestryError {
    fn from(err: rusqlite::Error) -> Self {
        TapestryError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TapestryError {
    fn from(err: tokio::task::JoinError) -> Self {
        TapestryError::Storage(format!("Background task failed: {}", err))
    }
}

impl From<serde_json::Error> for TapestryError {
    fn from(err: serde_json::Error) -> Self {
        TapestryError::Validation(err.to_string())
    }
}
