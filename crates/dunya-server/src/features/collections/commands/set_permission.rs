//! Set the permission tier a collection grants for one source file type

use dunya_common::types::PermissionTier;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{find_collection_by_slug, find_source_type};
use crate::db::DbError;
use crate::features::shared::validation::{validate_slug, SlugValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCollectionPermissionCommand {
    /// Taken from the URL
    #[serde(skip)]
    pub collection: String,

    /// Source file type slug, e.g. `mp3`
    pub source_type: String,

    pub permission: PermissionTier,

    /// Throttle downloads for non-staff users
    #[serde(default)]
    pub streamable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCollectionPermissionResponse {
    pub collection_id: Uuid,
    pub collection: String,
    pub source_type: String,
    pub permission: PermissionTier,
    pub streamable: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SetCollectionPermissionError {
    #[error("Invalid source type: {0}")]
    InvalidSourceType(#[from] SlugValidationError),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Source file type '{0}' not found")]
    SourceTypeNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<SetCollectionPermissionResponse, SetCollectionPermissionError>>
    for SetCollectionPermissionCommand
{
}

impl crate::cqrs::middleware::Command for SetCollectionPermissionCommand {}

impl SetCollectionPermissionCommand {
    pub fn validate(&self) -> Result<(), SetCollectionPermissionError> {
        validate_slug(&self.source_type, 50)?;
        Ok(())
    }
}

/// Create or replace the permission row for (collection, source type)
#[tracing::instrument(
    skip(pool, command),
    fields(collection = %command.collection, source_type = %command.source_type)
)]
pub async fn handle(
    pool: PgPool,
    command: SetCollectionPermissionCommand,
) -> Result<SetCollectionPermissionResponse, SetCollectionPermissionError> {
    command.validate()?;

    let collection = find_collection_by_slug(&pool, &command.collection)
        .await?
        .ok_or_else(|| SetCollectionPermissionError::CollectionNotFound(command.collection.clone()))?;
    let source_type = find_source_type(&pool, &command.source_type)
        .await?
        .ok_or_else(|| {
            SetCollectionPermissionError::SourceTypeNotFound(command.source_type.clone())
        })?;

    sqlx::query(
        "INSERT INTO collection_permissions (collection_id, source_type_id, permission, streamable)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (collection_id, source_type_id)
         DO UPDATE SET permission = EXCLUDED.permission, streamable = EXCLUDED.streamable",
    )
    .bind(collection.id)
    .bind(source_type.id)
    .bind(command.permission.code())
    .bind(command.streamable)
    .execute(&pool)
    .await?;

    tracing::info!(
        permission = command.permission.label(),
        streamable = command.streamable,
        "Collection permission set"
    );

    Ok(SetCollectionPermissionResponse {
        collection_id: collection.id,
        collection: collection.slug,
        source_type: source_type.slug,
        permission: command.permission,
        streamable: command.streamable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialise_permission_letter() {
        let command: SetCollectionPermissionCommand =
            serde_json::from_str(r#"{"source_type": "mp3", "permission": "R", "streamable": true}"#)
                .unwrap();
        assert_eq!(command.permission, PermissionTier::Restricted);
        assert!(command.streamable);
        assert!(command.collection.is_empty());
    }

    #[test]
    fn test_validation_requires_source_type() {
        let command = SetCollectionPermissionCommand {
            collection: "carnatic".to_string(),
            source_type: " ".to_string(),
            permission: PermissionTier::Unrestricted,
            streamable: false,
        };
        assert!(matches!(
            command.validate(),
            Err(SetCollectionPermissionError::InvalidSourceType(
                SlugValidationError::InvalidFormat
            ))
        ));
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let result: Result<SetCollectionPermissionCommand, _> =
            serde_json::from_str(r#"{"source_type": "mp3", "permission": "X"}"#);
        assert!(result.is_err());
    }
}
