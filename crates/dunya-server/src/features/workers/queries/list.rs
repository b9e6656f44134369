use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::super::WorkerState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListWorkersQuery {}

/// A worker with the tool versions it runs
#[derive(Debug, Clone, Serialize)]
pub struct WorkerListItem {
    pub id: Uuid,
    pub hostname: String,
    pub state: WorkerState,
    pub essentia_version: Option<String>,
    pub essentia_sha1: Option<String>,
    pub pycompmusic_sha1: Option<String>,
}

#[derive(sqlx::FromRow)]
struct WorkerListRow {
    id: Uuid,
    hostname: String,
    state: String,
    essentia_version: Option<String>,
    essentia_sha1: Option<String>,
    pycompmusic_sha1: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListWorkersError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<WorkerListItem>, ListWorkersError>> for ListWorkersQuery {}

impl crate::cqrs::middleware::Query for ListWorkersQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: ListWorkersQuery,
) -> Result<Vec<WorkerListItem>, ListWorkersError> {
    let rows = sqlx::query_as::<_, WorkerListRow>(
        "SELECT w.id, w.hostname, w.state,
                ev.version AS essentia_version, ev.sha1 AS essentia_sha1,
                pv.sha1 AS pycompmusic_sha1
         FROM workers w
         LEFT JOIN essentia_versions ev ON ev.id = w.essentia_id
         LEFT JOIN pycompmusic_versions pv ON pv.id = w.pycompmusic_id
         ORDER BY w.hostname",
    )
    .fetch_all(&pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| WorkerListItem {
            id: row.id,
            hostname: row.hostname,
            state: WorkerState::from_code(&row.state),
            essentia_version: row.essentia_version,
            essentia_sha1: row.essentia_sha1,
            pycompmusic_sha1: row.pycompmusic_sha1,
        })
        .collect())
}
