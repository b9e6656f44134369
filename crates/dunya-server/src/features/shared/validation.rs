//! Shared validation utilities

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlugValidationError {
    #[error("Slug is required and cannot be empty")]
    Required,

    #[error("Slug must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Slug can only contain lowercase letters, numbers, hyphens and dots")]
    InvalidFormat,

    #[error("Slug cannot start or end with a hyphen")]
    InvalidHyphenPlacement,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Validate a slug: lowercase ASCII letters, digits, `-` and `.`, no leading
/// or trailing hyphen.
pub fn validate_slug(slug: &str, max_length: usize) -> Result<(), SlugValidationError> {
    if slug.is_empty() {
        return Err(SlugValidationError::Required);
    }

    if slug.len() > max_length {
        return Err(SlugValidationError::TooLong { max_length });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(SlugValidationError::InvalidFormat);
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SlugValidationError::InvalidHyphenPlacement);
    }

    Ok(())
}

/// Validate a display name. Whitespace-only names are rejected.
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameValidationError::Required);
    }

    if trimmed.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// A git commit hash: 40 hex characters, either case
pub fn validate_sha1(sha1: &str) -> bool {
    sha1.len() == 40 && sha1.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("carnatic", 100).is_ok());
        assert!(validate_slug("makam-1.2", 100).is_ok());
        assert_eq!(validate_slug("", 100), Err(SlugValidationError::Required));
        assert_eq!(validate_slug("Carnatic", 100), Err(SlugValidationError::InvalidFormat));
        assert_eq!(
            validate_slug("-carnatic", 100),
            Err(SlugValidationError::InvalidHyphenPlacement)
        );
        assert_eq!(
            validate_slug(&"a".repeat(11), 10),
            Err(SlugValidationError::TooLong { max_length: 10 })
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Carnatic recordings", 100).is_ok());
        assert_eq!(validate_name("   ", 100), Err(NameValidationError::Required));
        assert_eq!(
            validate_name(&"a".repeat(101), 100),
            Err(NameValidationError::TooLong { max_length: 100 })
        );
    }

    #[test]
    fn test_validate_sha1() {
        assert!(validate_sha1("0123456789abcdef0123456789ABCDEF01234567"));
        assert!(!validate_sha1("0123456789abcdef"));
        assert!(!validate_sha1(&"g".repeat(40)));
    }
}
