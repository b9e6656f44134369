//! File download routes
//!
//! - `GET /docserver/by-id/:mbid/:slug?v=&subtype=&part=` - Download a source
//!   or derived file
//!
//! Downloads support byte ranges. Responses carry `X-Accel-Limit-Rate` so a
//! fronting nginx can throttle streams for users whose access tier is marked
//! streamable.

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::queries::{
    download::{self, DownloadFileQuery},
    resolve::{ResolveFileError, ResolveFileQuery},
};
use crate::api::response::ErrorResponse;
use crate::config::DocserverConfig;
use crate::docserver::resolver::FileRequest;
use crate::docserver::DocserverError;
use crate::features::FeatureState;
use crate::middleware::CurrentViewer;

pub const X_ACCEL_LIMIT_RATE: HeaderName = HeaderName::from_static("x-accel-limit-rate");

pub fn files_routes() -> Router<FeatureState> {
    Router::new()
        .route("/by-id/:mbid/:slug", get(download_file))
}

/// Query parameters narrowing a module's output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileParams {
    pub subtype: Option<String>,
    pub part: Option<String>,
    pub v: Option<String>,
}

impl FileParams {
    fn into_request(self, slug: String) -> FileRequest {
        FileRequest {
            slug,
            subtype: self.subtype,
            part: self.part,
            version: self.v,
        }
    }
}

/// Value of `X-Accel-Limit-Rate`: bytes per second, or `off`
pub fn limit_rate_value(rate_limited: bool, rate: u64) -> HeaderValue {
    if rate_limited {
        HeaderValue::from(rate)
    } else {
        HeaderValue::from_static("off")
    }
}

/// Download a file
///
/// # Endpoint
///
/// `GET /docserver/by-id/:mbid/:slug`
///
/// # Response
///
/// - `200 OK` / `206 Partial Content` - File contents
/// - `400 Bad Request` - Several files match; narrow with `v`, `subtype` or `part`
/// - `401 Unauthorized` - Access tier does not cover this file type
/// - `404 Not Found` - No such document, module, version or file
#[tracing::instrument(skip(pool, config, viewer, params, request))]
async fn download_file(
    State(pool): State<PgPool>,
    State(config): State<DocserverConfig>,
    CurrentViewer(viewer): CurrentViewer,
    Path((mbid, slug)): Path<(String, String)>,
    Query(params): Query<FileParams>,
    request: Request,
) -> Result<Response, FileApiError> {
    let query = DownloadFileQuery {
        file: ResolveFileQuery::new(mbid, params.into_request(slug)),
        viewer,
    };
    let plan = download::handle(pool, &config.audio_root, query).await?;

    let file_name = plan
        .file
        .full_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let served = ServeFile::new(&plan.file.full_path)
        .oneshot(request)
        .await
        .map_err(|e| FileApiError::Serve(e.to_string()))?;
    let mut response = served.map(Body::new);

    if response.status().is_success() {
        let headers = response.headers_mut();
        if let Ok(mimetype) = HeaderValue::from_str(&plan.file.mimetype) {
            headers.insert(header::CONTENT_TYPE, mimetype);
        }
        if let Ok(disposition) =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        {
            headers.insert(header::CONTENT_DISPOSITION, disposition);
        }
        headers.insert(
            X_ACCEL_LIMIT_RATE,
            limit_rate_value(plan.rate_limited, config.stream_rate_limit),
        );
    } else if response.status() == StatusCode::NOT_FOUND {
        tracing::warn!(path = %plan.file.full_path.display(), "Resolved file missing on disk");
        return Err(DocserverError::not_found("File is recorded but missing on disk").into());
    }

    Ok(response)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum FileApiError {
    #[error(transparent)]
    Resolve(#[from] ResolveFileError),
    #[error("Cannot serve file: {0}")]
    Serve(String),
}

impl From<DocserverError> for FileApiError {
    fn from(err: DocserverError) -> Self {
        Self::Resolve(err.into())
    }
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        match self {
            FileApiError::Resolve(ResolveFileError::Docserver(e)) => {
                ErrorResponse::new(e.code(), e.to_string()).into_response_with(e.status_code())
            },
            other => {
                tracing::error!("File API error: {}", other);
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_rate_header() {
        assert_eq!(limit_rate_value(true, 204800), "204800");
        assert_eq!(limit_rate_value(false, 204800), "off");
    }

    #[test]
    fn test_params_into_request() {
        let params = FileParams {
            subtype: Some("pitch".into()),
            part: None,
            v: Some("0.3".into()),
        };
        let request = params.into_request("pitch".into());
        assert_eq!(request.version.as_deref(), Some("0.3"));
        assert_eq!(request.slug, "pitch");
    }

    #[test]
    fn test_docserver_errors_keep_their_status() {
        let cases = [
            (DocserverError::not_found("x"), StatusCode::NOT_FOUND),
            (DocserverError::too_many("x"), StatusCode::BAD_REQUEST),
            (DocserverError::PermissionDenied("x".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(FileApiError::from(err).into_response().status(), status);
        }
    }
}
