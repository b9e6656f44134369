//! Decide whether and how a viewer may download a file
//!
//! Access is checked before the file is resolved, so a viewer without
//! permission learns nothing about which files exist.

use std::path::Path;

use serde::Serialize;
use sqlx::PgPool;

use super::resolve::{load, ResolveFileError, ResolveFileQuery};
use crate::db::docserver::grants_for;
use crate::docserver::access::{has_rate_limit, user_has_access, Viewer};
use crate::docserver::resolver::{self, ResolvedFile};
use crate::docserver::DocserverError;

#[derive(Debug, Clone)]
pub struct DownloadFileQuery {
    pub file: ResolveFileQuery,
    pub viewer: Viewer,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadPlan {
    pub file: ResolvedFile,
    /// Throttle the transfer to the configured stream rate
    pub rate_limited: bool,
}

impl crate::cqrs::middleware::Query for DownloadFileQuery {}

#[tracing::instrument(
    skip(pool, audio_root, query),
    fields(
        external_id = %query.file.external_id,
        slug = %query.file.request.slug,
        user_id = ?query.viewer.user_id
    )
)]
pub async fn handle(
    pool: PgPool,
    audio_root: &Path,
    query: DownloadFileQuery,
) -> Result<DownloadPlan, ResolveFileError> {
    let (document, loaded) = load(&pool, audio_root, &query.file).await?;

    let grants = match loaded.source_type_id {
        Some(source_type_id) => grants_for(&pool, document.id, source_type_id).await?,
        None => Vec::new(),
    };

    if !user_has_access(&query.viewer, loaded.kind, &grants) {
        tracing::info!("Download refused");
        return Err(DocserverError::PermissionDenied(
            "You don't have permission to access this resource".to_string(),
        )
        .into());
    }
    let rate_limited = has_rate_limit(&query.viewer, &grants);

    let file = resolver::resolve(&query.file.request, loaded.target)?;
    Ok(DownloadPlan { file, rate_limited })
}
