//! Feature slices of the Dunya API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes. Commands and queries implement `mediator::Request` so they can be
//! sent through [`crate::cqrs::build_mediator`] as well as called directly.
//!
//! # Features
//!
//! - **collections**: docserver collections and their permission tiers
//! - **documents**: documents, source files and the per-document log
//! - **files**: the derived-file resolver, downloads and helper lookups
//! - **modules**: analysis modules, versions, runs and deletion
//! - **workers**: analysis hosts and tool-version provenance
//! - **dashboard**: collection scanning, import and completeness checks

pub mod collections;
pub mod dashboard;
pub mod documents;
pub mod files;
pub mod modules;
pub mod shared;
pub mod workers;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Router;
use sqlx::PgPool;

use crate::config::DocserverConfig;
use crate::dashboard::CheckerRegistry;
use crate::processing::Processor;

/// Shared state for all feature routes. Handlers extract the part they need.
#[derive(Clone, FromRef)]
pub struct FeatureState {
    pub db: PgPool,
    pub docserver: DocserverConfig,
    pub processor: Processor,
    pub checkers: Arc<CheckerRegistry>,
}

/// All feature routes:
///
/// - `/docserver` - collections, documents, downloads, modules and workers
/// - `/dashboard` - collection import tracking
pub fn router(state: FeatureState) -> Router<()> {
    let docserver = Router::new()
        .merge(collections::collections_routes().with_state(state.db.clone()))
        .merge(documents::documents_routes().with_state(state.db.clone()))
        .merge(workers::workers_routes().with_state(state.db.clone()))
        .merge(files::files_routes().with_state(state.clone()))
        .merge(modules::modules_routes().with_state(state.clone()));

    Router::new()
        .nest("/docserver", docserver)
        .nest("/dashboard", dashboard::dashboard_routes().with_state(state))
}
