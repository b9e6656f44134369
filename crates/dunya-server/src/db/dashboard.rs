//! Dashboard persistence
//!
//! Collections, releases and files each have their own state, result and log
//! tables with the same shape. [`Owner`] picks the table set so one function
//! serves all three.

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use super::DbResult;
use crate::dashboard::checkers::{CheckerType, FileTarget, ResultRow};
use crate::dashboard::state::{ImportState, StateError, StateHistory, StateRow};

/// The kind of row a state, result or log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Collection,
    Release,
    Directory,
    File,
}

impl Owner {
    fn state_table(self) -> Option<(&'static str, &'static str)> {
        match self {
            Owner::Collection => Some(("collection_states", "collection_id")),
            Owner::Release => Some(("release_states", "release_id")),
            Owner::File => Some(("file_states", "file_id")),
            Owner::Directory => None,
        }
    }

    fn result_table(self) -> Option<(&'static str, &'static str)> {
        match self {
            Owner::Release => Some(("release_results", "release_id")),
            Owner::File => Some(("file_results", "file_id")),
            Owner::Collection | Owner::Directory => None,
        }
    }

    fn log_table(self) -> (&'static str, &'static str) {
        match self {
            Owner::Collection => ("collection_log_messages", "collection_id"),
            Owner::Release => ("release_log_messages", "release_id"),
            Owner::Directory => ("directory_log_messages", "directory_id"),
            Owner::File => ("file_log_messages", "file_id"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0:?} rows have no state")]
    Stateless(Owner),
}

// ============================================================================
// State
// ============================================================================

/// Append a state row without checking the transition. Used for the initial
/// NotStarted row.
pub async fn insert_state<'e, E>(
    executor: E,
    owner: Owner,
    owner_id: Uuid,
    code: &str,
) -> Result<(), StateStoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    let (table, column) = owner.state_table().ok_or(StateStoreError::Stateless(owner))?;
    sqlx::query(&format!("INSERT INTO {} ({}, state) VALUES ($1, $2)", table, column))
        .bind(owner_id)
        .bind(code)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn state_rows(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
) -> Result<Vec<StateRow>, StateStoreError> {
    let (table, column) = owner.state_table().ok_or(StateStoreError::Stateless(owner))?;
    let rows = sqlx::query_as::<_, StateRow>(&format!(
        "SELECT id, state, state_date FROM {} WHERE {} = $1 ORDER BY state_date DESC, id DESC",
        table, column
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn state_history<S: ImportState>(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
) -> Result<StateHistory<S>, StateStoreError> {
    let rows = state_rows(pool, owner, owner_id).await?;
    Ok(StateHistory::from_rows(rows)?)
}

/// Move to `next` if the current state allows it and record the change
pub async fn transition<S: ImportState>(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
    next: S,
) -> Result<S, StateStoreError> {
    let current: StateHistory<S> = state_history(pool, owner, owner_id).await?;
    let next = current.current.state.transition(next)?;
    insert_state(pool, owner, owner_id, next.code()).await?;
    tracing::debug!(?owner, %owner_id, state = next.name(), "State changed");
    Ok(next)
}

// ============================================================================
// Collections, releases and files
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardCollectionRow {
    pub id: Uuid,
    pub name: String,
    pub root_directory: String,
    pub last_updated: DateTime<Utc>,
    pub do_import: bool,
}

pub async fn find_collection(pool: &PgPool, id: Uuid) -> DbResult<Option<DashboardCollectionRow>> {
    let row = sqlx::query_as::<_, DashboardCollectionRow>(
        "SELECT id, name, root_directory, last_updated, do_import
         FROM dashboard_collections WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// A checker linked to a collection
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LinkedChecker {
    pub id: Uuid,
    pub name: String,
    pub module: String,
    pub checker_type: String,
}

impl LinkedChecker {
    pub fn kind(&self) -> Option<CheckerType> {
        CheckerType::from_code(&self.checker_type)
    }
}

/// Checkers of a collection, oldest first
pub async fn collection_checkers(pool: &PgPool, collection_id: Uuid) -> DbResult<Vec<LinkedChecker>> {
    let rows = sqlx::query_as::<_, LinkedChecker>(
        "SELECT c.id, c.name, c.module, c.checker_type
         FROM completeness_checkers c
         JOIN dashboard_collection_checkers l ON l.checker_id = c.id
         WHERE l.collection_id = $1
         ORDER BY c.created_at, c.id",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReleaseRow {
    pub id: Uuid,
    pub mbid: Uuid,
    pub collection_id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    pub ignore: bool,
}

pub async fn find_release(pool: &PgPool, id: Uuid) -> DbResult<Option<ReleaseRow>> {
    let row = sqlx::query_as::<_, ReleaseRow>(
        "SELECT id, mbid, collection_id, title, artist, ignore
         FROM musicbrainz_releases WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Every release of a collection, by title
pub async fn collection_releases(pool: &PgPool, collection_id: Uuid) -> DbResult<Vec<ReleaseRow>> {
    let rows = sqlx::query_as::<_, ReleaseRow>(
        "SELECT id, mbid, collection_id, title, artist, ignore
         FROM musicbrainz_releases WHERE collection_id = $1
         ORDER BY title, id",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Releases that are not ignored and have at least one directory on disk
pub async fn importable_releases(pool: &PgPool, collection_id: Uuid) -> DbResult<Vec<ReleaseRow>> {
    let rows = sqlx::query_as::<_, ReleaseRow>(
        "SELECT r.id, r.mbid, r.collection_id, r.title, r.artist, r.ignore
         FROM musicbrainz_releases r
         WHERE r.collection_id = $1
           AND NOT r.ignore
           AND EXISTS (SELECT 1 FROM collection_directories d WHERE d.release_id = r.id)
         ORDER BY r.title, r.id",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DirectoryRow {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub release_id: Option<Uuid>,
    pub path: String,
}

pub async fn release_directories(pool: &PgPool, release_id: Uuid) -> DbResult<Vec<DirectoryRow>> {
    let rows = sqlx::query_as::<_, DirectoryRow>(
        "SELECT id, collection_id, release_id, path FROM collection_directories
         WHERE release_id = $1 ORDER BY path",
    )
    .bind(release_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Scanned directories no release could be matched to
pub async fn unmatched_directories(
    pool: &PgPool,
    collection_id: Uuid,
) -> DbResult<Vec<DirectoryRow>> {
    let rows = sqlx::query_as::<_, DirectoryRow>(
        "SELECT id, collection_id, release_id, path FROM collection_directories
         WHERE collection_id = $1 AND release_id IS NULL ORDER BY path",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn directory_files(pool: &PgPool, directory_id: Uuid) -> DbResult<Vec<FileTarget>> {
    let rows = sqlx::query_as::<_, FileTarget>(
        "SELECT id, name, directory_id, recording_id, filesize FROM collection_files
         WHERE directory_id = $1 ORDER BY name",
    )
    .bind(directory_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every file in the directories matched to a release
pub async fn release_files(pool: &PgPool, release_id: Uuid) -> DbResult<Vec<FileTarget>> {
    let rows = sqlx::query_as::<_, FileTarget>(
        "SELECT f.id, f.name, f.directory_id, f.recording_id, f.filesize
         FROM collection_files f
         JOIN collection_directories d ON d.id = f.directory_id
         WHERE d.release_id = $1
         ORDER BY d.path, f.name",
    )
    .bind(release_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ============================================================================
// Checker results
// ============================================================================

pub async fn insert_result(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
    checker_id: Uuid,
    code: &str,
    data: &Value,
) -> Result<(), StateStoreError> {
    let (table, column) = owner.result_table().ok_or(StateStoreError::Stateless(owner))?;
    sqlx::query(&format!(
        "INSERT INTO {} ({}, checker_id, result, data) VALUES ($1, $2, $3, $4)",
        table, column
    ))
    .bind(owner_id)
    .bind(checker_id)
    .bind(code)
    .bind(data)
    .execute(pool)
    .await?;
    Ok(())
}

/// Every stored result for a release or file, with checker names
pub async fn results(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
) -> Result<Vec<ResultRow>, StateStoreError> {
    let (table, column) = owner.result_table().ok_or(StateStoreError::Stateless(owner))?;
    let rows = sqlx::query_as::<_, ResultRow>(&format!(
        "SELECT r.id, r.checker_id, c.name AS checker_name, r.result, r.data, r.datetime
         FROM {} r
         JOIN completeness_checkers c ON c.id = r.checker_id
         WHERE r.{} = $1
         ORDER BY r.datetime DESC, r.id DESC",
        table, column
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ============================================================================
// Log messages
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LogMessageRow {
    pub id: i64,
    pub checker_id: Option<Uuid>,
    pub message: String,
    pub datetime: DateTime<Utc>,
}

pub async fn add_log_message(
    pool: &PgPool,
    owner: Owner,
    owner_id: Uuid,
    message: &str,
    checker_id: Option<Uuid>,
) -> DbResult<()> {
    let (table, column) = owner.log_table();
    if owner == Owner::Collection {
        sqlx::query(&format!("INSERT INTO {} ({}, message) VALUES ($1, $2)", table, column))
            .bind(owner_id)
            .bind(message)
            .execute(pool)
            .await?;
    } else {
        sqlx::query(&format!(
            "INSERT INTO {} ({}, message, checker_id) VALUES ($1, $2, $3)",
            table, column
        ))
        .bind(owner_id)
        .bind(message)
        .bind(checker_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Log messages, newest first
pub async fn log_messages(pool: &PgPool, owner: Owner, owner_id: Uuid) -> DbResult<Vec<LogMessageRow>> {
    let (table, column) = owner.log_table();
    let checker = if owner == Owner::Collection {
        "NULL::uuid AS checker_id"
    } else {
        "checker_id"
    };
    let rows = sqlx::query_as::<_, LogMessageRow>(&format!(
        "SELECT id, {}, message, datetime FROM {} WHERE {} = $1 ORDER BY datetime DESC, id DESC",
        checker, table, column
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_collections_releases_and_files_have_state() {
        assert!(Owner::Collection.state_table().is_some());
        assert!(Owner::Release.state_table().is_some());
        assert!(Owner::File.state_table().is_some());
        assert!(Owner::Directory.state_table().is_none());
    }

    #[test]
    fn test_only_releases_and_files_have_results() {
        assert_eq!(Owner::File.result_table(), Some(("file_results", "file_id")));
        assert!(Owner::Collection.result_table().is_none());
    }

    #[test]
    fn test_every_owner_has_a_log() {
        for owner in [Owner::Collection, Owner::Release, Owner::Directory, Owner::File] {
            assert!(owner.log_table().0.ends_with("_log_messages"));
        }
    }
}
