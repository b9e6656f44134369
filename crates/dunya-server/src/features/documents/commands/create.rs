//! Add a document to a collection
//!
//! Documents are shared between collections: adding a document whose
//! external identifier is already known links the existing row to the
//! collection instead of creating a second one.

use dunya_common::types::ExternalId;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::DocumentRow;
use crate::features::shared::validation::{validate_name, NameValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentCommand {
    pub collection_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub external_identifier: Option<String>,
    pub collection_id: Uuid,
    /// False when an existing document was linked to the collection
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateDocumentError {
    #[error("Title validation failed: {0}")]
    TitleValidation(#[from] NameValidationError),

    #[error("Invalid external identifier: {0}")]
    InvalidExternalId(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CreateDocumentResponse, CreateDocumentError>> for CreateDocumentCommand {}

impl crate::cqrs::middleware::Command for CreateDocumentCommand {}

impl CreateDocumentCommand {
    /// External identifier in canonical form
    pub fn external_id(&self) -> Result<Option<ExternalId>, CreateDocumentError> {
        self.external_identifier
            .as_deref()
            .map(|id| {
                id.parse::<ExternalId>()
                    .map_err(|_| CreateDocumentError::InvalidExternalId(id.to_string()))
            })
            .transpose()
    }

    #[tracing::instrument(skip(self), fields(title = %self.title))]
    pub fn validate(&self) -> Result<(), CreateDocumentError> {
        validate_name(&self.title, 500)?;
        self.external_id()?;
        Ok(())
    }
}

#[tracing::instrument(
    skip(pool, command),
    fields(collection_id = %command.collection_id, external_id = ?command.external_identifier)
)]
pub async fn handle(
    pool: PgPool,
    command: CreateDocumentCommand,
) -> Result<CreateDocumentResponse, CreateDocumentError> {
    command.validate()?;
    let external_id = command.external_id()?.map(String::from);

    let mut tx = pool.begin().await?;

    let collection_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM collections WHERE id = $1)")
            .bind(command.collection_id)
            .fetch_one(&mut *tx)
            .await?;
    if !collection_exists {
        return Err(CreateDocumentError::CollectionNotFound(command.collection_id));
    }

    let existing = match external_id {
        Some(ref id) => {
            sqlx::query_as::<_, DocumentRow>(
                "SELECT id, title, external_identifier FROM documents WHERE external_identifier = $1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        },
        None => None,
    };

    let created = existing.is_none();
    let document = match existing {
        Some(document) => document,
        None => {
            sqlx::query_as::<_, DocumentRow>(
                "INSERT INTO documents (title, external_identifier) VALUES ($1, $2)
                 RETURNING id, title, external_identifier",
            )
            .bind(command.title.trim())
            .bind(&external_id)
            .fetch_one(&mut *tx)
            .await?
        },
    };

    sqlx::query(
        "INSERT INTO collection_documents (collection_id, document_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(command.collection_id)
    .bind(document.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(document_id = %document.id, created, "Document added to collection");
    Ok(CreateDocumentResponse {
        id: document.id,
        title: document.title,
        external_identifier: document.external_identifier,
        collection_id: command.collection_id,
        created,
    })
}
