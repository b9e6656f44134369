//! Import a scanned collection
//!
//! Every matched release that is not ignored moves to Importing together with
//! its files, the completeness checkers run, and the releases and files are
//! marked Finished. The collection finishes once all of its (non-ignored)
//! releases with directories on disk have. A release that cannot start
//! importing is put in Error and logged; the others carry on, and the
//! collection ends in Error so it can be rescanned.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::run_checkers::{self, CheckSummary, RunCheckersCommand, RunCheckersError};
use super::scan::mark_failed;
use crate::dashboard::state::status_can_finish;
use crate::dashboard::{CheckerRegistry, CollectionState, ItemState};
use crate::db::dashboard::{
    add_log_message, find_collection, importable_releases, release_files, state_history,
    transition, Owner, StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartImportCommand {
    pub collection_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub releases_imported: usize,
    pub releases_failed: usize,
    pub checks: CheckSummary,
    /// The collection reached Finished
    pub finished: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StartImportError {
    #[error("Dashboard collection {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Checkers(#[from] RunCheckersError),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<ImportSummary, StartImportError>> for StartImportCommand {}

impl crate::cqrs::middleware::Command for StartImportCommand {}

#[tracing::instrument(skip(pool, registry), fields(collection_id = %command.collection_id))]
pub async fn handle(
    pool: PgPool,
    registry: &CheckerRegistry,
    command: StartImportCommand,
) -> Result<ImportSummary, StartImportError> {
    let collection = find_collection(&pool, command.collection_id)
        .await?
        .ok_or(StartImportError::NotFound(command.collection_id))?;

    transition(&pool, Owner::Collection, collection.id, CollectionState::Importing).await?;

    let result = import_releases(&pool, registry, collection.id).await;
    match result {
        Ok(summary) => {
            tracing::info!(?summary, "Import complete");
            Ok(summary)
        },
        Err(e) => {
            tracing::error!(error = %e, "Import failed");
            mark_failed(&pool, collection.id, &format!("Import failed: {}", e)).await;
            Err(e)
        },
    }
}

async fn import_releases(
    pool: &PgPool,
    registry: &CheckerRegistry,
    collection_id: Uuid,
) -> Result<ImportSummary, StartImportError> {
    let mut summary = ImportSummary::default();
    let mut imported = Vec::new();

    for release in importable_releases(pool, collection_id).await? {
        match start_release_import(pool, release.id).await {
            Ok(()) => imported.push(release.id),
            Err(e) => {
                tracing::warn!(release_id = %release.id, error = %e, "Release cannot be imported");
                add_log_message(
                    pool,
                    Owner::Release,
                    release.id,
                    &format!("Cannot start import: {}", e),
                    None,
                )
                .await?;
                if let Err(e) = transition(pool, Owner::Release, release.id, ItemState::Error).await
                {
                    tracing::warn!(release_id = %release.id, error = %e, "Cannot set release to Error");
                }
                summary.releases_failed += 1;
            },
        }
    }

    summary.checks = run_checkers::handle(
        pool.clone(),
        registry,
        RunCheckersCommand { collection_id },
    )
    .await?;

    for release_id in &imported {
        finish_release(pool, *release_id).await?;
    }
    summary.releases_imported = imported.len();
    summary.finished = finish_collection(pool, collection_id).await?;
    Ok(summary)
}

/// Move a release to Importing, and every one of its files with it
pub async fn start_release_import(pool: &PgPool, release_id: Uuid) -> Result<(), StartImportError> {
    transition(pool, Owner::Release, release_id, ItemState::Importing).await?;
    for file in release_files(pool, release_id).await? {
        let history = state_history::<ItemState>(pool, Owner::File, file.id).await?;
        if history.current.state != ItemState::Importing {
            transition(pool, Owner::File, file.id, ItemState::Importing).await?;
        }
    }
    Ok(())
}

async fn finish_release(pool: &PgPool, release_id: Uuid) -> Result<(), StartImportError> {
    for file in release_files(pool, release_id).await? {
        transition(pool, Owner::File, file.id, ItemState::Finished).await?;
    }
    transition(pool, Owner::Release, release_id, ItemState::Finished).await?;
    Ok(())
}

/// Finish the collection if every importable release has finished.
///
/// Releases left without directories by a rescan do not count. Otherwise the
/// collection goes to Error with the reason in its log, so a rescan can start.
pub async fn finish_collection(pool: &PgPool, collection_id: Uuid) -> Result<bool, StartImportError> {
    let mut states = Vec::new();
    for release in importable_releases(pool, collection_id).await? {
        let history = state_history::<ItemState>(pool, Owner::Release, release.id).await?;
        states.push(history.current.state);
    }

    if status_can_finish(&states) {
        transition(pool, Owner::Collection, collection_id, CollectionState::Finished).await?;
        return Ok(true);
    }

    let finished = states.iter().filter(|s| **s == ItemState::Finished).count();
    tracing::warn!(finished, total = states.len(), "Collection cannot finish");
    mark_failed(
        pool,
        collection_id,
        &format!("Import incomplete: {} of {} releases finished", finished, states.len()),
    )
    .await;
    Ok(false)
}
