//! Add a collection to the dashboard
//!
//! The collection starts NotStarted. Checkers are given by module name and
//! must exist in `completeness_checkers`.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dashboard::CollectionState;
use crate::dashboard::ImportState;
use crate::db::dashboard::{insert_state, Owner, StateStoreError};
use crate::features::shared::{is_unique_violation, validate_name, NameValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDashboardCollectionCommand {
    /// MusicBrainz collection id
    pub collection_id: Uuid,
    pub name: String,
    pub root_directory: String,
    #[serde(default)]
    pub checkers: Vec<String>,
    #[serde(default = "default_do_import")]
    pub do_import: bool,
}

fn default_do_import() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDashboardCollectionResponse {
    pub id: Uuid,
    pub name: String,
    pub root_directory: String,
    pub do_import: bool,
    pub checkers: Vec<String>,
    pub state: CollectionState,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateDashboardCollectionError {
    #[error("Invalid name: {0}")]
    NameValidation(#[from] NameValidationError),

    #[error("Root directory is required")]
    RootRequired,

    #[error("Unknown checker '{0}'")]
    CheckerNotFound(String),

    #[error("Collection {0} is already on the dashboard")]
    Duplicate(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StateStoreError),
}

impl Request<Result<CreateDashboardCollectionResponse, CreateDashboardCollectionError>>
    for CreateDashboardCollectionCommand
{
}

impl crate::cqrs::middleware::Command for CreateDashboardCollectionCommand {}

impl CreateDashboardCollectionCommand {
    pub fn validate(&self) -> Result<(), CreateDashboardCollectionError> {
        validate_name(&self.name, 200)?;
        if self.root_directory.trim().is_empty() {
            return Err(CreateDashboardCollectionError::RootRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(collection_id = %command.collection_id))]
pub async fn handle(
    pool: PgPool,
    command: CreateDashboardCollectionCommand,
) -> Result<CreateDashboardCollectionResponse, CreateDashboardCollectionError> {
    command.validate()?;

    let mut checker_ids = Vec::with_capacity(command.checkers.len());
    for module in &command.checkers {
        let id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM completeness_checkers WHERE module = $1")
                .bind(module)
                .fetch_optional(&pool)
                .await?;
        checker_ids.push(id.ok_or_else(|| CreateDashboardCollectionError::CheckerNotFound(module.clone()))?);
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO dashboard_collections (id, name, root_directory, do_import)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(command.collection_id)
    .bind(command.name.trim())
    .bind(command.root_directory.trim())
    .bind(command.do_import)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CreateDashboardCollectionError::Duplicate(command.collection_id)
        } else {
            CreateDashboardCollectionError::Database(e)
        }
    })?;

    for checker_id in &checker_ids {
        sqlx::query(
            "INSERT INTO dashboard_collection_checkers (collection_id, checker_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(command.collection_id)
        .bind(checker_id)
        .execute(&mut *tx)
        .await?;
    }

    insert_state(
        &mut *tx,
        Owner::Collection,
        command.collection_id,
        CollectionState::NotStarted.code(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(name = %command.name, "Dashboard collection created");
    Ok(CreateDashboardCollectionResponse {
        id: command.collection_id,
        name: command.name.trim().to_string(),
        root_directory: command.root_directory.trim().to_string(),
        do_import: command.do_import,
        checkers: command.checkers,
        state: CollectionState::NotStarted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let command: CreateDashboardCollectionCommand = serde_json::from_str(
            r#"{"collection_id": "f96e7215-b2bd-4962-a2f0-b3f6a6e6e8c2",
                "name": "Carnatic", "root_directory": "/srv/carnatic"}"#,
        )
        .unwrap();
        assert!(command.do_import);
        assert!(command.checkers.is_empty());
        assert!(command.validate().is_ok());
    }

    #[test]
    fn test_root_required() {
        let command = CreateDashboardCollectionCommand {
            collection_id: Uuid::new_v4(),
            name: "Makam".to_string(),
            root_directory: " ".to_string(),
            checkers: vec![],
            do_import: true,
        };
        assert!(matches!(
            command.validate(),
            Err(CreateDashboardCollectionError::RootRequired)
        ));
    }
}
