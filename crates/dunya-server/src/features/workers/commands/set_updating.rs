use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::super::{WorkerResponse, WorkerRow, WorkerState};

/// Mark a host as being upgraded; processing results it produces meanwhile
/// may carry stale provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWorkerUpdatingCommand {
    pub hostname: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SetWorkerUpdatingError {
    #[error("Worker '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<WorkerResponse, SetWorkerUpdatingError>> for SetWorkerUpdatingCommand {}

impl crate::cqrs::middleware::Command for SetWorkerUpdatingCommand {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: SetWorkerUpdatingCommand,
) -> Result<WorkerResponse, SetWorkerUpdatingError> {
    let worker = sqlx::query_as::<_, WorkerRow>(
        "UPDATE workers SET state = $2 WHERE hostname = $1
         RETURNING id, hostname, essentia_id, pycompmusic_id, state",
    )
    .bind(&command.hostname)
    .bind(WorkerState::Updating.code())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| SetWorkerUpdatingError::NotFound(command.hostname.clone()))?;

    Ok(worker.into())
}
