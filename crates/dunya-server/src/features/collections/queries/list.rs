//! List docserver collections

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCollectionsQuery {}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionListItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub num_documents: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListCollectionsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<CollectionListItem>, ListCollectionsError>> for ListCollectionsQuery {}

impl crate::cqrs::middleware::Query for ListCollectionsQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: ListCollectionsQuery,
) -> Result<Vec<CollectionListItem>, ListCollectionsError> {
    let items = sqlx::query_as::<_, CollectionListItem>(
        "SELECT c.id, c.name, c.slug, c.description,
                (SELECT COUNT(*) FROM collection_documents cd WHERE cd.collection_id = c.id) AS num_documents
         FROM collections c
         ORDER BY c.name",
    )
    .fetch_all(&pool)
    .await?;

    tracing::debug!(count = items.len(), "Collections listed");
    Ok(items)
}
