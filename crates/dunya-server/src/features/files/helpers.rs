//! Convenience lookups built on the resolver
//!
//! Server-side code that needs analysis output (rather than sending it to a
//! client) goes through these. No access check is applied.

use std::path::{Path, PathBuf};

use sqlx::PgPool;

use super::queries::resolve::{self, ResolveFileError, ResolveFileQuery};
use crate::docserver::resolver::FileRequest;
use crate::docserver::DocserverError;

/// Full path of the file on disk
pub async fn filename(
    pool: &PgPool,
    audio_root: &Path,
    external_id: &str,
    request: FileRequest,
) -> Result<PathBuf, ResolveFileError> {
    let resolved = resolve::handle(
        pool.clone(),
        audio_root,
        ResolveFileQuery::new(external_id, request),
    )
    .await?;
    Ok(resolved.file.full_path)
}

/// Raw contents. A file that is recorded but missing on disk is NotFound.
pub async fn contents(
    pool: &PgPool,
    audio_root: &Path,
    external_id: &str,
    request: FileRequest,
) -> Result<Vec<u8>, ResolveFileError> {
    let path = filename(pool, audio_root, external_id, request).await?;
    tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Cannot read resolved file");
        DocserverError::not_found(format!("Cannot read file {}", path.display())).into()
    })
}

/// Contents parsed as JSON
pub async fn json(
    pool: &PgPool,
    audio_root: &Path,
    external_id: &str,
    request: FileRequest,
) -> Result<serde_json::Value, ResolveFileError> {
    let bytes = contents(pool, audio_root, external_id, request).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| DocserverError::not_found(format!("File is not valid JSON: {}", e)).into())
}

/// Download URL of the file
pub async fn url(
    pool: &PgPool,
    audio_root: &Path,
    external_id: &str,
    request: FileRequest,
) -> Result<String, ResolveFileError> {
    let resolved = resolve::handle(
        pool.clone(),
        audio_root,
        ResolveFileQuery::new(external_id, request),
    )
    .await?;
    Ok(resolved.url)
}
