//! Document detail: collections, source files and the derived map

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::docserver::{derived_rows, document_collections, find_document, source_files};
use crate::db::DbError;
use crate::docserver::derived_map::{self, DerivedMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDocumentQuery {
    pub external_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    pub external_identifier: Option<String>,
    pub title: String,
    /// Collection slugs
    pub collections: Vec<String>,
    /// Extensions of the source files
    pub sourcefiles: Vec<String>,
    /// `{module slug: {outputname: {extension, mimetype, numparts, versions}}}`
    pub derivedfiles: DerivedMap,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDocumentError {
    #[error("Cannot find a document with id {0}")]
    NotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<DocumentDetail, GetDocumentError>> for GetDocumentQuery {}

impl crate::cqrs::middleware::Query for GetDocumentQuery {}

#[tracing::instrument(skip(pool, query), fields(external_id = %query.external_id))]
pub async fn handle(pool: PgPool, query: GetDocumentQuery) -> Result<DocumentDetail, GetDocumentError> {
    let document = find_document(&pool, &query.external_id)
        .await?
        .ok_or_else(|| GetDocumentError::NotFound(query.external_id.clone()))?;

    let collections = document_collections(&pool, document.id)
        .await?
        .into_iter()
        .map(|c| c.slug)
        .collect();
    let sourcefiles = source_files(&pool, document.id, None)
        .await?
        .into_iter()
        .map(|f| f.extension)
        .collect();
    let derivedfiles = derived_map::build(derived_rows(&pool, document.id).await?);

    Ok(DocumentDetail {
        external_identifier: document.external_identifier,
        title: document.title,
        collections,
        sourcefiles,
        derivedfiles,
    })
}
