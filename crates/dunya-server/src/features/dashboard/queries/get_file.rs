use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::get_collection::checker_order;
use super::get_release::{split_results, CheckerHistory};
use crate::dashboard::checkers::ResultRow;
use crate::dashboard::{CheckerType, ItemState, StateHistory};
use crate::db::dashboard::{
    collection_checkers, log_messages, results, state_history, LogMessageRow, Owner,
    StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileQuery {
    pub file_id: Uuid,
}

/// A scanned file with its state, checker results and log
#[derive(Debug, Clone, Serialize)]
pub struct FileDetail {
    pub id: Uuid,
    pub name: String,
    pub directory: String,
    pub collection_id: Uuid,
    pub release_id: Option<Uuid>,
    pub recording_id: Option<Uuid>,
    pub filesize: Option<i64>,
    pub state: StateHistory<ItemState>,
    pub latest_results: Vec<ResultRow>,
    pub previous_results: Vec<CheckerHistory>,
    pub log: Vec<LogMessageRow>,
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: Uuid,
    name: String,
    directory: String,
    collection_id: Uuid,
    release_id: Option<Uuid>,
    recording_id: Option<Uuid>,
    filesize: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetFileError {
    #[error("File {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for GetFileError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(DbError::Sqlx(err))
    }
}

impl Request<Result<FileDetail, GetFileError>> for GetFileQuery {}

impl crate::cqrs::middleware::Query for GetFileQuery {}

#[tracing::instrument(skip(pool), fields(file_id = %query.file_id))]
pub async fn handle(pool: PgPool, query: GetFileQuery) -> Result<FileDetail, GetFileError> {
    let file = sqlx::query_as::<_, FileRow>(
        "SELECT f.id, f.name, d.path AS directory, d.collection_id, d.release_id,
                f.recording_id, f.filesize
         FROM collection_files f
         JOIN collection_directories d ON d.id = f.directory_id
         WHERE f.id = $1",
    )
    .bind(query.file_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetFileError::NotFound(query.file_id))?;

    let checkers = collection_checkers(&pool, file.collection_id).await?;
    let order = checker_order(&checkers, CheckerType::File);
    let (latest, previous) = split_results(results(&pool, Owner::File, file.id).await?, &order);

    Ok(FileDetail {
        id: file.id,
        name: file.name,
        directory: file.directory,
        collection_id: file.collection_id,
        release_id: file.release_id,
        recording_id: file.recording_id,
        filesize: file.filesize,
        state: state_history::<ItemState>(&pool, Owner::File, file.id).await?,
        latest_results: latest,
        previous_results: previous,
        log: log_messages(&pool, Owner::File, file.id).await?,
    })
}
