//! Resolve a (document, slug) request to one stored file

use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::docserver::{find_document, load_slug_target, DocumentRow, LoadedTarget};
use crate::db::DbError;
use crate::docserver::resolver::{self, FileRequest, ResolvedFile};
use crate::docserver::DocserverError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveFileQuery {
    pub external_id: String,
    #[serde(flatten)]
    pub request: FileRequest,
}

impl ResolveFileQuery {
    pub fn new(external_id: impl Into<String>, request: FileRequest) -> Self {
        Self {
            external_id: external_id.into(),
            request,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveFileResponse {
    #[serde(flatten)]
    pub file: ResolvedFile,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveFileError {
    #[error(transparent)]
    Docserver(#[from] DocserverError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ResolveFileError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(DbError::Sqlx(err))
    }
}

impl crate::cqrs::middleware::Query for ResolveFileQuery {}

/// Document row and slug candidates for a query
pub async fn load(
    pool: &PgPool,
    audio_root: &Path,
    query: &ResolveFileQuery,
) -> Result<(DocumentRow, LoadedTarget), ResolveFileError> {
    let document = find_document(pool, &query.external_id).await?.ok_or_else(|| {
        DocserverError::not_found(format!("Cannot find a document with id {}", query.external_id))
    })?;
    let target = load_slug_target(pool, document.id, &query.request.slug, audio_root).await?;
    Ok((document, target))
}

#[tracing::instrument(
    skip(pool, audio_root, query),
    fields(external_id = %query.external_id, slug = %query.request.slug)
)]
pub async fn handle(
    pool: PgPool,
    audio_root: &Path,
    query: ResolveFileQuery,
) -> Result<ResolveFileResponse, ResolveFileError> {
    let (_, loaded) = load(&pool, audio_root, &query).await?;
    let file = resolver::resolve(&query.request, loaded.target)?;
    let url = file.url(&query.external_id);

    tracing::debug!(path = %file.full_path.display(), "File resolved");
    Ok(ResolveFileResponse { file, url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_deserialises_version_alias() {
        let query: ResolveFileQuery = serde_json::from_str(
            r#"{"external_id": "8c2f8e5f-5f2b-4c3e-9d3a-1b2c3d4e5f60", "slug": "pitch", "v": "0.3", "part": "2"}"#,
        )
        .unwrap();
        assert_eq!(query.request.slug, "pitch");
        assert_eq!(query.request.version.as_deref(), Some("0.3"));
        assert_eq!(query.request.part.as_deref(), Some("2"));
        assert!(query.request.subtype.is_none());
    }
}
