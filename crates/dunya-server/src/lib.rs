//! Dunya Server Library
#![recursion_limit = "256"]
//!
//! HTTP server for the Dunya music corpus: the docserver that stores audio
//! and the output of analysis modules, and the dashboard that tracks how
//! complete each imported collection is.
//!
//! # Overview
//!
//! - **Docserver**: collections, documents, source files and derived files,
//!   resolved by `(document, slug, subtype, part, version)`
//! - **Access control**: permission tiers per collection and a rate limit on
//!   streamed audio
//! - **Processing**: analysis modules registered in process, versioned, and
//!   run over collections or single recordings
//! - **Dashboard**: a state machine per collection, release and file, with
//!   completeness checkers run during import
//!
//! # Architecture
//!
//! The server follows a **CQRS** layout. Every feature under [`features`] is a
//! vertical slice of commands (writes, POST/PUT/DELETE) and queries (reads,
//! GET). Rules that do not need the database live in [`docserver`],
//! [`dashboard`] and [`processing`] so they can be tested without Postgres.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extractors
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower**: middleware (compression, tracing, CORS)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dunya_server::{config::Config, processing::{ModuleRegistry, Processor}};
//!
//! # async fn run(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let processor = Processor::new(pool, Arc::new(ModuleRegistry::builtin()), &config.docserver);
//! assert_eq!(processor.is_enabled(), config.docserver.processing_enabled);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod dashboard;
pub mod db;
pub mod docserver;
pub mod error;
pub mod features;
pub mod middleware;
pub mod processing;

pub use error::AppError;
