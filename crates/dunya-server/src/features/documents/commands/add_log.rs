//! Append a message to a document's processing log

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{add_document_log, find_document, DocumentLogRow};
use crate::db::DbError;

const LEVELS: &[&str] = &["debug", "info", "warning", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLogMessageCommand {
    #[serde(skip)]
    pub external_id: String,
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub module_version: Option<Uuid>,
    #[serde(default)]
    pub source_file: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddLogMessageError {
    #[error("Level must be one of: {}", LEVELS.join(", "))]
    InvalidLevel,

    #[error("Message is required")]
    MessageRequired,

    #[error("Cannot find a document with id {0}")]
    DocumentNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<DocumentLogRow, AddLogMessageError>> for AddLogMessageCommand {}

impl crate::cqrs::middleware::Command for AddLogMessageCommand {}

impl AddLogMessageCommand {
    pub fn validate(&self) -> Result<(), AddLogMessageError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(AddLogMessageError::InvalidLevel);
        }
        if self.message.trim().is_empty() {
            return Err(AddLogMessageError::MessageRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(external_id = %command.external_id))]
pub async fn handle(
    pool: PgPool,
    command: AddLogMessageCommand,
) -> Result<DocumentLogRow, AddLogMessageError> {
    command.validate()?;

    let document = find_document(&pool, &command.external_id)
        .await?
        .ok_or_else(|| AddLogMessageError::DocumentNotFound(command.external_id.clone()))?;

    let row = add_document_log(
        &pool,
        document.id,
        &command.level,
        &command.message,
        command.module_version,
        command.source_file,
    )
    .await?;
    Ok(row)
}
