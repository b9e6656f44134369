//! Create collection command
//!
//! A collection groups documents that share a root directory on disk. The
//! slug is derived from the name once, at creation, and never changes.

use chrono::{DateTime, Utc};
use dunya_common::types::slugify;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::CollectionRow;
use crate::features::shared::validation::{validate_name, NameValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionCommand {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Directory holding the collection's source files, one sub-directory
    /// per source type
    pub root_directory: String,

    /// Use this identifier instead of generating one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub root_directory: String,
    pub created_at: DateTime<Utc>,
}

impl From<CollectionRow> for CreateCollectionResponse {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            root_directory: row.root_directory,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateCollectionError {
    #[error("Name validation failed: {0}")]
    NameValidation(#[from] NameValidationError),

    #[error("Name must contain at least one letter or digit")]
    EmptySlug,

    #[error("Root directory is required")]
    RootRequired,

    #[error("Collection '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CreateCollectionResponse, CreateCollectionError>> for CreateCollectionCommand {}

impl crate::cqrs::middleware::Command for CreateCollectionCommand {}

impl CreateCollectionCommand {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub fn validate(&self) -> Result<(), CreateCollectionError> {
        validate_name(&self.name, 255)?;
        if self.slug().is_empty() {
            return Err(CreateCollectionError::EmptySlug);
        }
        if self.root_directory.trim().is_empty() {
            return Err(CreateCollectionError::RootRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(name = %command.name))]
pub async fn handle(
    pool: PgPool,
    command: CreateCollectionCommand,
) -> Result<CreateCollectionResponse, CreateCollectionError> {
    command.validate()?;
    let slug = command.slug();

    let row = sqlx::query_as::<_, CollectionRow>(
        "INSERT INTO collections (id, name, slug, description, root_directory)
         VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5)
         RETURNING id, name, slug, description, root_directory, created_at",
    )
    .bind(command.collection_id)
    .bind(command.name.trim())
    .bind(&slug)
    .bind(&command.description)
    .bind(command.root_directory.trim())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        crate::features::shared::map_unique_violation(
            e,
            CreateCollectionError::Duplicate(slug.clone()),
            CreateCollectionError::Database,
        )
    })?;

    tracing::info!(collection_id = %row.id, slug = %row.slug, "Collection created");
    Ok(row.into())
}
