//! Get a collection and the documents in it

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{find_collection_by_slug, CollectionRow};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCollectionQuery {
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionDocument {
    pub external_identifier: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetCollectionResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub root_directory: String,
    pub documents: Vec<CollectionDocument>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCollectionError {
    #[error("Collection '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<GetCollectionResponse, GetCollectionError>> for GetCollectionQuery {}

impl crate::cqrs::middleware::Query for GetCollectionQuery {}

#[tracing::instrument(skip(pool, query), fields(slug = %query.slug))]
pub async fn handle(
    pool: PgPool,
    query: GetCollectionQuery,
) -> Result<GetCollectionResponse, GetCollectionError> {
    let CollectionRow {
        id,
        name,
        slug,
        description,
        root_directory,
        ..
    } = find_collection_by_slug(&pool, &query.slug)
        .await?
        .ok_or_else(|| GetCollectionError::NotFound(query.slug.clone()))?;

    let documents = sqlx::query_as::<_, CollectionDocument>(
        "SELECT d.external_identifier, d.title
         FROM documents d
         JOIN collection_documents cd ON cd.document_id = d.id
         WHERE cd.collection_id = $1
         ORDER BY d.title, d.id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(GetCollectionResponse {
        id,
        name,
        slug,
        description,
        root_directory,
        documents,
    })
}
