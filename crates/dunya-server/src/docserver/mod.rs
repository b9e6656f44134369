//! Docserver core
//!
//! Database-free logic for locating stored files and deciding who may read
//! them. The feature slices load rows from Postgres and hand them to these
//! functions, which keeps the rules unit testable.
//!
//! - [`resolver`]: maps (document, slug, subtype, part, version) to one file
//! - [`access`]: permission tiers and rate limiting
//! - [`layout`]: where files live on disk and how they are addressed by URL
//! - [`derived_map`]: the per-document summary of analysis output

pub mod access;
pub mod derived_map;
pub mod layout;
pub mod resolver;

use axum::http::StatusCode;

/// The three ways a docserver lookup can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocserverError {
    /// No matching document, file, module or version
    #[error("{0}")]
    NotFound(String),
    /// More than one candidate; the caller must narrow the request
    #[error("{0}")]
    TooMany(String),
    /// The caller's permission tier does not cover the file type
    #[error("{0}")]
    PermissionDenied(String),
}

impl DocserverError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn too_many(message: impl Into<String>) -> Self {
        Self::TooMany(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DocserverError::NotFound(_) => StatusCode::NOT_FOUND,
            DocserverError::TooMany(_) => StatusCode::BAD_REQUEST,
            DocserverError::PermissionDenied(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine readable code used in the JSON error envelope
    pub fn code(&self) -> &'static str {
        match self {
            DocserverError::NotFound(_) => "NOT_FOUND",
            DocserverError::TooMany(_) => "TOO_MANY_FILES",
            DocserverError::PermissionDenied(_) => "PERMISSION_DENIED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(DocserverError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DocserverError::too_many("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            DocserverError::PermissionDenied("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_message_is_passed_through() {
        let err = DocserverError::not_found("No parts on this file");
        assert_eq!(err.to_string(), "No parts on this file");
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
