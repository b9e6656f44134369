//! Dunya Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Dunya workspace.
//!
//! - **Error Handling**: [`DunyaError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by the server and the CLI
//! - **Types**: external identifiers, slugs and permission tiers
//! - **Checksums**: SHA-256 helpers for stored files and API tokens
//!
//! # Example
//!
//! ```no_run
//! use dunya_common::{types::ExternalId, Result};
//!
//! fn shard_for(mbid: &str) -> Result<String> {
//!     let id: ExternalId = mbid.parse()?;
//!     Ok(id.stub().to_string())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{DunyaError, Result};
