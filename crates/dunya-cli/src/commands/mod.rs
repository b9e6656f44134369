//! Command implementations

pub mod collections;
pub mod document;
pub mod download;
pub mod status;
