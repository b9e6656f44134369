//! Shared utilities for feature modules
//!
//! - **validation**: input checks used by commands
//! - **error_helpers**: classification of database constraint errors

pub mod error_helpers;
pub mod validation;

pub use error_helpers::{is_unique_violation, map_unique_violation};
pub use validation::{validate_name, validate_slug, NameValidationError, SlugValidationError};
