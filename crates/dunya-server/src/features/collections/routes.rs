//! Collection API routes
//!
//! - `GET /docserver/collections` - List collections
//! - `GET /docserver/collections/:slug` - Collection with its documents
//! - `POST /docserver/collections` - Create a collection (staff)
//! - `PUT /docserver/collections/:slug/permissions` - Set a file type's tier (staff)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use sqlx::PgPool;

use super::{
    commands::{
        CreateCollectionCommand, CreateCollectionError, SetCollectionPermissionCommand,
        SetCollectionPermissionError,
    },
    queries::{GetCollectionError, GetCollectionQuery, ListCollectionsError, ListCollectionsQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::middleware::StaffUser;

pub fn collections_routes() -> Router<PgPool> {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route("/collections/:slug", get(get_collection))
        .route("/collections/:slug/permissions", put(set_permission))
}

/// Create a collection
///
/// # Endpoint
///
/// `POST /docserver/collections`
///
/// ```json
/// { "name": "Carnatic", "description": "", "root_directory": "/srv/carnatic" }
/// ```
///
/// # Response
///
/// - `201 Created` - Collection created
/// - `400 Bad Request` - Validation error
/// - `401 Unauthorized` - Not staff
/// - `409 Conflict` - A collection with the same slug exists
#[tracing::instrument(skip(pool, _staff, command), fields(name = %command.name))]
async fn create_collection(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Json(command): Json<CreateCollectionCommand>,
) -> Result<Response, CollectionApiError> {
    let response = super::commands::create::handle(pool, command).await?;
    tracing::info!(slug = %response.slug, "Collection created via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Set the permission tier of one source file type
///
/// # Endpoint
///
/// `PUT /docserver/collections/:slug/permissions`
///
/// ```json
/// { "source_type": "mp3", "permission": "R", "streamable": true }
/// ```
///
/// # Response
///
/// - `200 OK` - Permission stored
/// - `404 Not Found` - Unknown collection or source type
#[tracing::instrument(skip(pool, _staff, command))]
async fn set_permission(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(slug): Path<String>,
    Json(mut command): Json<SetCollectionPermissionCommand>,
) -> Result<Response, CollectionApiError> {
    command.collection = slug;
    let response = super::commands::set_permission::handle(pool, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// `GET /docserver/collections`
#[tracing::instrument(skip(pool))]
async fn list_collections(State(pool): State<PgPool>) -> Result<Response, CollectionApiError> {
    let items = super::queries::list::handle(pool, ListCollectionsQuery {}).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(items))).into_response())
}

/// `GET /docserver/collections/:slug`
///
/// - `200 OK` - Collection with its documents
/// - `404 Not Found` - Unknown collection
#[tracing::instrument(skip(pool))]
async fn get_collection(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<Response, CollectionApiError> {
    let response = super::queries::get::handle(pool, GetCollectionQuery { slug }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum CollectionApiError {
    #[error(transparent)]
    Create(#[from] CreateCollectionError),
    #[error(transparent)]
    SetPermission(#[from] SetCollectionPermissionError),
    #[error(transparent)]
    Get(#[from] GetCollectionError),
    #[error(transparent)]
    List(#[from] ListCollectionsError),
}

impl IntoResponse for CollectionApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            CollectionApiError::Create(
                CreateCollectionError::NameValidation(_)
                | CreateCollectionError::EmptySlug
                | CreateCollectionError::RootRequired,
            )
            | CollectionApiError::SetPermission(SetCollectionPermissionError::InvalidSourceType(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            CollectionApiError::Create(CreateCollectionError::Duplicate(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            },
            CollectionApiError::SetPermission(
                SetCollectionPermissionError::CollectionNotFound(_)
                | SetCollectionPermissionError::SourceTypeNotFound(_),
            )
            | CollectionApiError::Get(GetCollectionError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            _ => {
                tracing::error!("Database error in collections API: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return error.into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };
        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let response = CollectionApiError::from(CreateCollectionError::Duplicate("x".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response =
            CollectionApiError::from(GetCollectionError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CollectionApiError::from(CreateCollectionError::RootRequired).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
