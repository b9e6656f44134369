//! A document's processing log, newest first

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::docserver::{find_document, DocumentLogRow};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListLogMessagesQuery {
    pub external_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ListLogMessagesError {
    #[error("Cannot find a document with id {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<Vec<DocumentLogRow>, ListLogMessagesError>> for ListLogMessagesQuery {}

impl crate::cqrs::middleware::Query for ListLogMessagesQuery {}

#[tracing::instrument(skip(pool, query), fields(external_id = %query.external_id))]
pub async fn handle(
    pool: PgPool,
    query: ListLogMessagesQuery,
) -> Result<Vec<DocumentLogRow>, ListLogMessagesError> {
    let document = find_document(&pool, &query.external_id)
        .await?
        .ok_or_else(|| ListLogMessagesError::NotFound(query.external_id.clone()))?;

    let rows = sqlx::query_as::<_, DocumentLogRow>(
        "SELECT id, level, message, module_version_id, source_file_id, datetime
         FROM document_log_messages
         WHERE document_id = $1
         ORDER BY datetime DESC",
    )
    .bind(document.id)
    .fetch_all(&pool)
    .await?;
    Ok(rows)
}
