//! Error types for the Dunya CLI

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// User-facing CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    /// The server answered with an error envelope
    #[error("{message} ({code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Several files match; the request must be narrowed
    #[error("{0}. Narrow the request with --subtype, --part or --module-version.")]
    TooMany(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}. Set DUNYA_API_TOKEN to a token with access to this collection.")]
    PermissionDenied(String),

    #[error("Invalid recording id: {0}")]
    InvalidId(#[from] dunya_common::DunyaError),

    #[error("Checksum mismatch: expected {expected}, got {actual}. The partial file was removed.")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}. Check DUNYA_SERVER_URL and DUNYA_API_TIMEOUT_SECS.")]
    Config(String),

    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Network request failed: {0}. Check your connection and the server URL.")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CliError {
    /// Map an error envelope to the error the user should see.
    ///
    /// The docserver's three lookup failures get their own variants; anything
    /// else keeps the server's code.
    pub fn from_envelope(status: u16, code: &str, message: &str) -> Self {
        match code {
            "TOO_MANY_FILES" => CliError::TooMany(message.to_string()),
            "NOT_FOUND" => CliError::NotFound(message.to_string()),
            "PERMISSION_DENIED" => CliError::PermissionDenied(message.to_string()),
            _ => CliError::Api {
                status,
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_envelope() {
        assert!(matches!(
            CliError::from_envelope(400, "TOO_MANY_FILES", "Found more than 1 part without part set"),
            CliError::TooMany(_)
        ));
        assert!(matches!(
            CliError::from_envelope(401, "PERMISSION_DENIED", "no"),
            CliError::PermissionDenied(_)
        ));

        let err = CliError::from_envelope(500, "INTERNAL_ERROR", "An internal error occurred");
        assert_eq!(err.to_string(), "An internal error occurred (INTERNAL_ERROR)");
    }
}
