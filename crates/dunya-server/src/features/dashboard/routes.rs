//! Dashboard routes (all staff only)
//!
//! - `GET /dashboard/collections` - Collections with their current state
//! - `POST /dashboard/collections` - Add a collection
//! - `GET /dashboard/collections/:id?order=` - Collection overview
//! - `POST /dashboard/collections/:id/scan` - Scan the root directory
//! - `POST /dashboard/collections/:id/import` - Import scanned releases
//! - `GET /dashboard/releases/:id` - Release detail
//! - `PUT /dashboard/releases/:id/ignore` - Exclude or include a release
//! - `GET /dashboard/files/:id` - File detail

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    commands::{
        CreateDashboardCollectionCommand, CreateDashboardCollectionError, ScanCollectionCommand,
        ScanCollectionError, SetReleaseIgnoreCommand, SetReleaseIgnoreError, StartImportCommand,
        StartImportError,
    },
    queries::{
        GetDashboardCollectionError, GetDashboardCollectionQuery, GetFileError, GetFileQuery,
        GetReleaseError, GetReleaseQuery, ListDashboardCollectionsError,
        ListDashboardCollectionsQuery,
    },
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::dashboard::CheckerRegistry;
use crate::db::dashboard::StateStoreError;
use crate::features::FeatureState;
use crate::middleware::StaffUser;

pub fn dashboard_routes() -> Router<FeatureState> {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route("/collections/:id", get(get_collection))
        .route("/collections/:id/scan", post(scan_collection))
        .route("/collections/:id/import", post(start_import))
        .route("/releases/:id", get(get_release))
        .route("/releases/:id/ignore", put(set_release_ignore))
        .route("/files/:id", get(get_file))
}

/// Add a collection to the dashboard
///
/// # Endpoint
///
/// `POST /dashboard/collections`
///
/// ```json
/// {
///   "collection_id": "f96e7215-b2bd-4962-a2f0-b3f6a6e6e8c2",
///   "name": "Carnatic",
///   "root_directory": "/incoming/carnatic",
///   "checkers": ["file.has_recording_id", "release.all_files_matched"]
/// }
/// ```
///
/// # Response
///
/// - `201 Created` - Collection added in state NotStarted
/// - `400 Bad Request` - Validation error or unknown checker
/// - `409 Conflict` - Collection already on the dashboard
#[tracing::instrument(skip(pool, _staff, command), fields(collection_id = %command.collection_id))]
async fn create_collection(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Json(command): Json<CreateDashboardCollectionCommand>,
) -> Result<Response, DashboardApiError> {
    let response = super::commands::create_collection::handle(pool, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Scan a collection
///
/// # Endpoint
///
/// `POST /dashboard/collections/:id/scan`
///
/// # Response
///
/// - `200 OK` - Scan summary; collection is Scanned
/// - `409 Conflict` - The collection's state does not allow a scan
/// - `500` - Scan failed; collection is in Error with a log message
#[tracing::instrument(skip(pool, _staff))]
async fn scan_collection(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(collection_id): Path<Uuid>,
) -> Result<Response, DashboardApiError> {
    let summary =
        super::commands::scan::handle(pool, ScanCollectionCommand { collection_id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary))).into_response())
}

/// Import a scanned collection
///
/// # Endpoint
///
/// `POST /dashboard/collections/:id/import`
///
/// # Response
///
/// - `200 OK` - Import summary
/// - `409 Conflict` - The collection has not been scanned
#[tracing::instrument(skip(pool, checkers, _staff))]
async fn start_import(
    State(pool): State<PgPool>,
    State(checkers): State<Arc<CheckerRegistry>>,
    _staff: StaffUser,
    Path(collection_id): Path<Uuid>,
) -> Result<Response, DashboardApiError> {
    let summary =
        super::commands::import::handle(pool, &checkers, StartImportCommand { collection_id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary))).into_response())
}

/// `PUT /dashboard/releases/:id/ignore` with `{ "ignore": true }`
#[tracing::instrument(skip(pool, _staff, command))]
async fn set_release_ignore(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(release_id): Path<Uuid>,
    Json(mut command): Json<SetReleaseIgnoreCommand>,
) -> Result<Response, DashboardApiError> {
    command.release_id = release_id;
    let release = super::commands::set_ignore::handle(pool, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(release))).into_response())
}

/// `GET /dashboard/collections`
#[tracing::instrument(skip(pool, _staff))]
async fn list_collections(
    State(pool): State<PgPool>,
    _staff: StaffUser,
) -> Result<Response, DashboardApiError> {
    let items = super::queries::list::handle(pool, ListDashboardCollectionsQuery {}).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(items))).into_response())
}

/// `GET /dashboard/collections/:id?order=date|unmatched|ignored|error`
#[tracing::instrument(skip(pool, _staff, query))]
async fn get_collection(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(collection_id): Path<Uuid>,
    Query(mut query): Query<GetDashboardCollectionQuery>,
) -> Result<Response, DashboardApiError> {
    query.collection_id = collection_id;
    let overview = super::queries::get_collection::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(overview))).into_response())
}

/// `GET /dashboard/releases/:id`
#[tracing::instrument(skip(pool, _staff))]
async fn get_release(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(release_id): Path<Uuid>,
) -> Result<Response, DashboardApiError> {
    let release = super::queries::get_release::handle(pool, GetReleaseQuery { release_id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(release))).into_response())
}

/// `GET /dashboard/files/:id`
#[tracing::instrument(skip(pool, _staff))]
async fn get_file(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(file_id): Path<Uuid>,
) -> Result<Response, DashboardApiError> {
    let file = super::queries::get_file::handle(pool, GetFileQuery { file_id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(file))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum DashboardApiError {
    #[error(transparent)]
    Create(#[from] CreateDashboardCollectionError),
    #[error(transparent)]
    Scan(#[from] ScanCollectionError),
    #[error(transparent)]
    Import(#[from] StartImportError),
    #[error(transparent)]
    SetIgnore(#[from] SetReleaseIgnoreError),
    #[error(transparent)]
    List(#[from] ListDashboardCollectionsError),
    #[error(transparent)]
    GetCollection(#[from] GetDashboardCollectionError),
    #[error(transparent)]
    GetRelease(#[from] GetReleaseError),
    #[error(transparent)]
    GetFile(#[from] GetFileError),
}

impl IntoResponse for DashboardApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DashboardApiError::Create(
                CreateDashboardCollectionError::NameValidation(_)
                | CreateDashboardCollectionError::RootRequired
                | CreateDashboardCollectionError::CheckerNotFound(_),
            )
            | DashboardApiError::GetCollection(GetDashboardCollectionError::InvalidOrder(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            DashboardApiError::Create(CreateDashboardCollectionError::Duplicate(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            },
            DashboardApiError::Scan(ScanCollectionError::Store(StateStoreError::State(_)))
            | DashboardApiError::Import(StartImportError::Store(StateStoreError::State(_))) => {
                (StatusCode::CONFLICT, "INVALID_STATE")
            },
            DashboardApiError::Scan(ScanCollectionError::NotFound(_))
            | DashboardApiError::Import(StartImportError::NotFound(_))
            | DashboardApiError::SetIgnore(SetReleaseIgnoreError::NotFound(_))
            | DashboardApiError::GetCollection(GetDashboardCollectionError::NotFound(_))
            | DashboardApiError::GetRelease(GetReleaseError::NotFound(_))
            | DashboardApiError::GetFile(GetFileError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            DashboardApiError::Scan(ScanCollectionError::Scan(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SCAN_FAILED")
            },
            _ => {
                tracing::error!("Dashboard API error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                return error.into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };
        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::StateError;

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = StateError::InvalidTransition {
            from: "Not started",
            to: "Importing",
        };
        let response =
            DashboardApiError::from(StartImportError::Store(StateStoreError::State(err)))
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_and_validation() {
        let response =
            DashboardApiError::from(GetReleaseError::NotFound(Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = DashboardApiError::from(GetDashboardCollectionError::InvalidOrder(
            "Unknown release order 'size'".into(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
