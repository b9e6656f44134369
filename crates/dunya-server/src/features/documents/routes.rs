//! Document API routes
//!
//! - `POST /docserver/documents` - Add a document to a collection (staff)
//! - `POST /docserver/documents/:mbid/sourcefiles` - Register a source file (staff)
//! - `GET /docserver/by-id/:mbid` - Document detail with its derived map
//! - `GET /docserver/by-id/:mbid/logs` - Processing log (staff)
//! - `POST /docserver/by-id/:mbid/logs` - Append to the processing log (staff)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;

use super::{
    commands::{
        AddLogMessageCommand, AddLogMessageError, AddSourceFileCommand, AddSourceFileError,
        CreateDocumentCommand, CreateDocumentError,
    },
    queries::{GetDocumentError, GetDocumentQuery, ListLogMessagesError, ListLogMessagesQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::middleware::StaffUser;

pub fn documents_routes() -> Router<PgPool> {
    Router::new()
        .route("/documents", post(create_document))
        .route("/documents/:mbid/sourcefiles", post(add_source_file))
        .route("/by-id/:mbid", get(get_document))
        .route("/by-id/:mbid/logs", get(list_logs).post(add_log))
}

/// Add a document to a collection
///
/// # Endpoint
///
/// `POST /docserver/documents`
///
/// ```json
/// { "collection_id": "…", "title": "Raga Bhairavi", "external_identifier": "…" }
/// ```
///
/// # Response
///
/// - `201 Created` - New document
/// - `200 OK` - Existing document linked to the collection
/// - `404 Not Found` - Unknown collection
#[tracing::instrument(skip(pool, _staff, command), fields(title = %command.title))]
async fn create_document(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Json(command): Json<CreateDocumentCommand>,
) -> Result<Response, DocumentApiError> {
    let response = super::commands::create::handle(pool, command).await?;
    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(response))).into_response())
}

/// Register a source file
///
/// # Endpoint
///
/// `POST /docserver/documents/:mbid/sourcefiles`
///
/// ```json
/// { "file_type": "mp3", "path": "/srv/carnatic/audio/8c/track.mp3" }
/// ```
///
/// # Response
///
/// - `201 Created` - File registered
/// - `200 OK` - Existing file of the same type updated
/// - `400 Bad Request` - File does not exist or no path given
/// - `404 Not Found` - Unknown document or file type
#[tracing::instrument(skip(pool, _staff, command))]
async fn add_source_file(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(mbid): Path<String>,
    Json(mut command): Json<AddSourceFileCommand>,
) -> Result<Response, DocumentApiError> {
    command.external_id = mbid;
    let response = super::commands::add_source_file::handle(pool, command).await?;
    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(response))).into_response())
}

/// `GET /docserver/by-id/:mbid`
///
/// - `200 OK` - Title, collections, source file extensions and derived files
/// - `404 Not Found` - Unknown document
#[tracing::instrument(skip(pool))]
async fn get_document(
    State(pool): State<PgPool>,
    Path(mbid): Path<String>,
) -> Result<Response, DocumentApiError> {
    let detail = super::queries::get::handle(pool, GetDocumentQuery { external_id: mbid }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(detail))).into_response())
}

/// `GET /docserver/by-id/:mbid/logs`
#[tracing::instrument(skip(pool, _staff))]
async fn list_logs(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(mbid): Path<String>,
) -> Result<Response, DocumentApiError> {
    let rows =
        super::queries::list_logs::handle(pool, ListLogMessagesQuery { external_id: mbid }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rows))).into_response())
}

/// `POST /docserver/by-id/:mbid/logs`
///
/// ```json
/// { "level": "error", "message": "Pitch extraction failed" }
/// ```
#[tracing::instrument(skip(pool, _staff, command))]
async fn add_log(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(mbid): Path<String>,
    Json(mut command): Json<AddLogMessageCommand>,
) -> Result<Response, DocumentApiError> {
    command.external_id = mbid;
    let row = super::commands::add_log::handle(pool, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum DocumentApiError {
    #[error(transparent)]
    Create(#[from] CreateDocumentError),
    #[error(transparent)]
    AddSourceFile(#[from] AddSourceFileError),
    #[error(transparent)]
    AddLog(#[from] AddLogMessageError),
    #[error(transparent)]
    Get(#[from] GetDocumentError),
    #[error(transparent)]
    ListLogs(#[from] ListLogMessagesError),
}

impl IntoResponse for DocumentApiError {
    fn into_response(self) -> Response {
        use DocumentApiError as E;

        let (status, code) = match &self {
            E::Create(CreateDocumentError::TitleValidation(_))
            | E::Create(CreateDocumentError::InvalidExternalId(_))
            | E::AddSourceFile(AddSourceFileError::PathRequired)
            | E::AddSourceFile(AddSourceFileError::Unreadable { .. })
            | E::AddSourceFile(AddSourceFileError::NoCollection(_))
            | E::AddLog(AddLogMessageError::InvalidLevel)
            | E::AddLog(AddLogMessageError::MessageRequired) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            E::Create(CreateDocumentError::CollectionNotFound(_))
            | E::AddSourceFile(AddSourceFileError::DocumentNotFound(_))
            | E::AddSourceFile(AddSourceFileError::FileTypeNotFound(_))
            | E::AddLog(AddLogMessageError::DocumentNotFound(_))
            | E::Get(GetDocumentError::NotFound(_))
            | E::ListLogs(ListLogMessagesError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            _ => {
                tracing::error!("Database error in documents API: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return error.into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };
        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}
