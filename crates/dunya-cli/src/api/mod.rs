//! HTTP client for the Dunya docserver

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{ApiClient, Download};
pub use types::*;
