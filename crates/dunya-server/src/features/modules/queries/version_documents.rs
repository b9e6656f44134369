//! Documents a module version has (or has not yet) processed

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{
    documents_for_version, find_collection_by_slug, find_module_version, DocumentRow,
};
use crate::db::DbError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionDocumentsQuery {
    #[serde(skip)]
    pub version_id: Uuid,

    /// Restrict to one collection, by slug
    #[serde(default)]
    pub collection: Option<String>,

    /// `true` lists processed documents, `false` the ones still to do
    #[serde(default)]
    pub processed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionDocumentsError {
    #[error("Module version {0} not found")]
    VersionNotFound(Uuid),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<Vec<DocumentRow>, VersionDocumentsError>> for VersionDocumentsQuery {}

impl crate::cqrs::middleware::Query for VersionDocumentsQuery {}

#[tracing::instrument(skip(pool), fields(version_id = %query.version_id))]
pub async fn handle(
    pool: PgPool,
    query: VersionDocumentsQuery,
) -> Result<Vec<DocumentRow>, VersionDocumentsError> {
    if find_module_version(&pool, query.version_id).await?.is_none() {
        return Err(VersionDocumentsError::VersionNotFound(query.version_id));
    }

    let collection_id = match query.collection {
        Some(ref slug) => Some(
            find_collection_by_slug(&pool, slug)
                .await?
                .ok_or_else(|| VersionDocumentsError::CollectionNotFound(slug.clone()))?
                .id,
        ),
        None => None,
    };

    Ok(documents_for_version(&pool, query.version_id, collection_id, query.processed).await?)
}
