//! Error types shared across Dunya crates

use thiserror::Error;

/// Result type alias for Dunya operations
pub type Result<T> = std::result::Result<T, DunyaError>;

/// Main error type for Dunya
#[derive(Error, Debug)]
pub enum DunyaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid external identifier: {0}")]
    InvalidExternalId(String),

    #[error("Invalid permission tier: {0}")]
    InvalidPermission(String),
}
