//! Scan a dashboard collection's root directory
//!
//! Every directory holding mp3 files is recorded with its files. A directory
//! whose files all carry the same release MBID is matched to that release,
//! which is created on first sight. Rescanning updates sizes and tags in
//! place; new releases and files start NotStarted.
//!
//! Any failure after the scan has started puts the collection in Error and
//! leaves a message in the collection log.

use std::path::PathBuf;

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::dashboard::scanner::{self, ScanError, ScannedDirectory};
use crate::dashboard::{CollectionState, ImportState, ItemState};
use crate::db::dashboard::{
    add_log_message, find_collection, insert_state, transition, Owner, StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCollectionCommand {
    pub collection_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub directories: usize,
    pub files: usize,
    pub new_files: usize,
    pub matched_directories: usize,
    pub new_releases: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanCollectionError {
    #[error("Dashboard collection {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<ScanSummary, ScanCollectionError>> for ScanCollectionCommand {}

impl crate::cqrs::middleware::Command for ScanCollectionCommand {}

#[tracing::instrument(skip(pool), fields(collection_id = %command.collection_id))]
pub async fn handle(
    pool: PgPool,
    command: ScanCollectionCommand,
) -> Result<ScanSummary, ScanCollectionError> {
    let collection = find_collection(&pool, command.collection_id)
        .await?
        .ok_or(ScanCollectionError::NotFound(command.collection_id))?;

    transition(&pool, Owner::Collection, collection.id, CollectionState::Scanning).await?;
    tracing::info!(root = %collection.root_directory, "Scanning collection");

    let root = PathBuf::from(&collection.root_directory);
    let result = async {
        let directories =
            tokio::task::spawn_blocking(move || scanner::scan_directory(&root)).await??;
        let summary = store_scan(&pool, collection.id, &directories).await?;
        transition(&pool, Owner::Collection, collection.id, CollectionState::Scanned).await?;
        sqlx::query("UPDATE dashboard_collections SET last_updated = NOW() WHERE id = $1")
            .bind(collection.id)
            .execute(&pool)
            .await?;
        Ok::<_, ScanCollectionError>(summary)
    }
    .await;

    match result {
        Ok(summary) => {
            tracing::info!(?summary, "Scan complete");
            Ok(summary)
        },
        Err(e) => {
            tracing::error!(error = %e, "Scan failed");
            mark_failed(&pool, collection.id, &format!("Scan failed: {}", e)).await;
            Err(e)
        },
    }
}

/// Put a collection in Error and log why. Failures here are only logged so
/// the original error reaches the caller.
pub(crate) async fn mark_failed(pool: &PgPool, collection_id: Uuid, message: &str) {
    if let Err(e) = transition(pool, Owner::Collection, collection_id, CollectionState::Error).await
    {
        tracing::warn!(%collection_id, error = %e, "Cannot set collection to Error");
    }
    if let Err(e) = add_log_message(pool, Owner::Collection, collection_id, message, None).await {
        tracing::warn!(%collection_id, error = %e, "Cannot write collection log");
    }
}

#[derive(sqlx::FromRow)]
struct Upserted {
    id: Uuid,
    created: bool,
}

async fn store_scan(
    pool: &PgPool,
    collection_id: Uuid,
    directories: &[ScannedDirectory],
) -> Result<ScanSummary, ScanCollectionError> {
    let mut summary = ScanSummary {
        directories: directories.len(),
        ..Default::default()
    };
    let mut tx = pool.begin().await?;

    for directory in directories {
        let release_id = match directory.release_mbid() {
            Some(mbid) => {
                let title = directory
                    .album_title()
                    .map(str::to_string)
                    .unwrap_or_else(|| mbid.to_string());
                let release = upsert_release(&mut tx, collection_id, mbid, &title).await?;
                if release.created {
                    insert_state(&mut *tx, Owner::Release, release.id, ItemState::NotStarted.code())
                        .await?;
                    summary.new_releases += 1;
                }
                summary.matched_directories += 1;
                Some(release.id)
            },
            None => None,
        };

        let directory_id: Uuid = sqlx::query_scalar(
            "INSERT INTO collection_directories (collection_id, release_id, path)
             VALUES ($1, $2, $3)
             ON CONFLICT (collection_id, path) DO UPDATE SET release_id = EXCLUDED.release_id
             RETURNING id",
        )
        .bind(collection_id)
        .bind(release_id)
        .bind(&directory.path)
        .fetch_one(&mut *tx)
        .await?;

        for file in &directory.files {
            let stored = sqlx::query_as::<_, Upserted>(
                "INSERT INTO collection_files (name, directory_id, recording_id, filesize)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (directory_id, name) DO UPDATE
                     SET recording_id = EXCLUDED.recording_id, filesize = EXCLUDED.filesize
                 RETURNING id, (xmax = 0) AS created",
            )
            .bind(&file.name)
            .bind(directory_id)
            .bind(file.tags.recording_mbid)
            .bind(file.size)
            .fetch_one(&mut *tx)
            .await?;
            if stored.created {
                insert_state(&mut *tx, Owner::File, stored.id, ItemState::NotStarted.code())
                    .await?;
                summary.new_files += 1;
            }
            summary.files += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}

async fn upsert_release(
    tx: &mut Transaction<'_, Postgres>,
    collection_id: Uuid,
    mbid: Uuid,
    title: &str,
) -> Result<Upserted, sqlx::Error> {
    sqlx::query_as::<_, Upserted>(
        "INSERT INTO musicbrainz_releases (mbid, collection_id, title)
         VALUES ($1, $2, $3)
         ON CONFLICT (mbid, collection_id) DO UPDATE SET title = musicbrainz_releases.title
         RETURNING id, (xmax = 0) AS created",
    )
    .bind(mbid)
    .bind(collection_id)
    .bind(title)
    .fetch_one(&mut **tx)
    .await
}
