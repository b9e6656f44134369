//! Register a source file for a document
//!
//! Paths are stored relative to `<collection root>/<stype>`. An absolute
//! path below that directory is accepted and made relative. The size is read
//! from disk, so the file must exist when it is registered.

use std::path::Path;

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{document_collections, find_document, find_source_type};
use crate::db::DbError;
use crate::docserver::layout::{relative_source_path, source_type_root};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSourceFileCommand {
    /// Taken from the URL
    #[serde(skip)]
    pub external_id: String,

    /// Source file type slug
    pub file_type: String,

    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AddSourceFileResponse {
    pub id: Uuid,
    pub path: String,
    pub size: i64,
    /// False when an existing file of this type was replaced
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AddSourceFileError {
    #[error("Path is required")]
    PathRequired,

    #[error("Cannot find a document with id {0}")]
    DocumentNotFound(String),

    #[error("Document {0} is not in any collection")]
    NoCollection(String),

    #[error("Source file type '{0}' not found")]
    FileTypeNotFound(String),

    #[error("Cannot read source file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<AddSourceFileResponse, AddSourceFileError>> for AddSourceFileCommand {}

impl crate::cqrs::middleware::Command for AddSourceFileCommand {}

impl AddSourceFileCommand {
    pub fn validate(&self) -> Result<(), AddSourceFileError> {
        if self.path.trim().is_empty() {
            return Err(AddSourceFileError::PathRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, command),
    fields(external_id = %command.external_id, file_type = %command.file_type)
)]
pub async fn handle(
    pool: PgPool,
    command: AddSourceFileCommand,
) -> Result<AddSourceFileResponse, AddSourceFileError> {
    command.validate()?;

    let document = find_document(&pool, &command.external_id)
        .await?
        .ok_or_else(|| AddSourceFileError::DocumentNotFound(command.external_id.clone()))?;
    let collection = document_collections(&pool, document.id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AddSourceFileError::NoCollection(command.external_id.clone()))?;
    let file_type = find_source_type(&pool, &command.file_type)
        .await?
        .ok_or_else(|| AddSourceFileError::FileTypeNotFound(command.file_type.clone()))?;

    let type_root = source_type_root(Path::new(&collection.root_directory), &file_type.stype);
    let relative = relative_source_path(&type_root, command.path.trim());
    let full_path = type_root.join(&relative);
    let size = tokio::fs::metadata(&full_path)
        .await
        .map_err(|source| AddSourceFileError::Unreadable {
            path: full_path.display().to_string(),
            source,
        })?
        .len() as i64;

    // xmax is 0 only for rows this statement inserted
    let response = sqlx::query_as::<_, AddSourceFileResponse>(
        "INSERT INTO source_files (document_id, file_type_id, path, size)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (document_id, file_type_id)
         DO UPDATE SET path = EXCLUDED.path, size = EXCLUDED.size
         RETURNING id, path, size, (xmax = 0) AS created",
    )
    .bind(document.id)
    .bind(file_type.id)
    .bind(&relative)
    .bind(size)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        source_file_id = %response.id,
        path = %response.path,
        size = response.size,
        created = response.created,
        "Source file registered"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_requires_path() {
        let command = AddSourceFileCommand {
            external_id: "8c2f8e5f-5f2b-4c3e-9d3a-1b2c3d4e5f60".to_string(),
            file_type: "mp3".to_string(),
            path: "  ".to_string(),
        };
        assert!(matches!(command.validate(), Err(AddSourceFileError::PathRequired)));
    }

    #[test]
    fn test_deserialise_ignores_external_id() {
        let command: AddSourceFileCommand =
            serde_json::from_str(r#"{"file_type": "mp3", "path": "a/b.mp3"}"#).unwrap();
        assert!(command.external_id.is_empty());
        assert_eq!(command.path, "a/b.mp3");
    }
}
