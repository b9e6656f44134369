//! Analysis module routes (all staff only)
//!
//! - `GET /docserver/modules` - List modules with their latest version
//! - `POST /docserver/modules` - Register a module compiled into the server
//! - `POST /docserver/modules/:id/versions` - Record the server's current version
//! - `POST /docserver/modules/:id/run` - Queue a run over a collection or recordings
//! - `DELETE /docserver/modules/:id` - Delete a module and all its output
//! - `DELETE /docserver/versions/:id` - Delete one version and its output
//! - `GET /docserver/versions/:id/documents?collection=&processed=` - Documents
//!   the version has or has not processed

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    commands::{
        delete::{DeleteModuleCommand, DeleteVersionCommand},
        CreateModuleCommand, CreateModuleError, RegisterVersionCommand, RegisterVersionError,
        RunModuleCommand, RunModuleError,
    },
    queries::{ListModulesError, ListModulesQuery, VersionDocumentsError, VersionDocumentsQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::db::DbError;
use crate::features::FeatureState;
use crate::middleware::StaffUser;
use crate::processing::{ProcessingError, Processor};

pub fn modules_routes() -> Router<FeatureState> {
    Router::new()
        .route("/modules", get(list_modules).post(create_module))
        .route("/modules/:id", delete(delete_module))
        .route("/modules/:id/versions", post(register_version))
        .route("/modules/:id/run", post(run_module))
        .route("/versions/:id", delete(delete_version))
        .route("/versions/:id/documents", get(version_documents))
}

/// Register a module
///
/// # Endpoint
///
/// `POST /docserver/modules`
///
/// ```json
/// { "module": "dunya.filehash.FileHash", "collections": ["carnatic"] }
/// ```
///
/// # Response
///
/// - `201 Created` - Module and its first version recorded
/// - `400 Bad Request` - Module is not compiled into this server
/// - `404 Not Found` - Unknown collection or source type
/// - `409 Conflict` - Module already registered
#[tracing::instrument(skip(pool, processor, _staff, command), fields(module = %command.module))]
async fn create_module(
    State(pool): State<PgPool>,
    State(processor): State<Processor>,
    _staff: StaffUser,
    Json(command): Json<CreateModuleCommand>,
) -> Result<Response, ModuleApiError> {
    let response = super::commands::create::handle(pool, processor.registry(), command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// `POST /docserver/modules/:id/versions`
///
/// - `201 Created` - A new version was recorded
/// - `200 OK` - The version was already known
#[tracing::instrument(skip(pool, processor, _staff))]
async fn register_version(
    State(pool): State<PgPool>,
    State(processor): State<Processor>,
    _staff: StaffUser,
    Path(module_id): Path<Uuid>,
) -> Result<Response, ModuleApiError> {
    let response = super::commands::register_version::handle(
        pool,
        processor.registry(),
        RegisterVersionCommand { module_id },
    )
    .await?;
    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(response))).into_response())
}

/// Queue a module run
///
/// # Endpoint
///
/// `POST /docserver/modules/:id/run`
///
/// ```json
/// { "collection": "carnatic" }
/// { "recordings": ["f5b5c8a2-..."] }
/// ```
///
/// # Response
///
/// - `202 Accepted` - Run queued; body says how many documents
/// - `404 Not Found` - Unknown module, version or collection
/// - `503 Service Unavailable` - Processing is disabled on this server
#[tracing::instrument(skip(processor, _staff, command))]
async fn run_module(
    State(processor): State<Processor>,
    _staff: StaffUser,
    Path(module_id): Path<Uuid>,
    Json(mut command): Json<RunModuleCommand>,
) -> Result<Response, ModuleApiError> {
    command.module_id = module_id;
    let summary = super::commands::run::handle(&processor, command).await?;
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(summary))).into_response())
}

/// `DELETE /docserver/modules/:id`
#[tracing::instrument(skip(processor, _staff))]
async fn delete_module(
    State(processor): State<Processor>,
    _staff: StaffUser,
    Path(module_id): Path<Uuid>,
) -> Result<Response, ModuleApiError> {
    let summary =
        super::commands::delete::handle_module(&processor, DeleteModuleCommand { module_id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary))).into_response())
}

/// `DELETE /docserver/versions/:id`
#[tracing::instrument(skip(processor, _staff))]
async fn delete_version(
    State(processor): State<Processor>,
    _staff: StaffUser,
    Path(version_id): Path<Uuid>,
) -> Result<Response, ModuleApiError> {
    let summary =
        super::commands::delete::handle_version(&processor, DeleteVersionCommand { version_id })
            .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary))).into_response())
}

/// `GET /docserver/modules`
#[tracing::instrument(skip(pool, _staff))]
async fn list_modules(
    State(pool): State<PgPool>,
    _staff: StaffUser,
) -> Result<Response, ModuleApiError> {
    let modules = super::queries::list::handle(pool, ListModulesQuery {}).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(modules))).into_response())
}

/// `GET /docserver/versions/:id/documents`
#[tracing::instrument(skip(pool, _staff, query))]
async fn version_documents(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(version_id): Path<Uuid>,
    Query(mut query): Query<VersionDocumentsQuery>,
) -> Result<Response, ModuleApiError> {
    query.version_id = version_id;
    let documents = super::queries::version_documents::handle(pool, query).await?;
    let meta = serde_json::json!({ "total": documents.len() });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(documents, meta))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum ModuleApiError {
    #[error(transparent)]
    Create(#[from] CreateModuleError),
    #[error(transparent)]
    RegisterVersion(#[from] RegisterVersionError),
    #[error(transparent)]
    Run(#[from] RunModuleError),
    #[error(transparent)]
    Delete(#[from] DbError),
    #[error(transparent)]
    List(#[from] ListModulesError),
    #[error(transparent)]
    Documents(#[from] VersionDocumentsError),
}

impl IntoResponse for ModuleApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ModuleApiError::Create(
                CreateModuleError::ModuleRequired
                | CreateModuleError::NotRegistered(_)
                | CreateModuleError::ReservedSlug(_),
            )
            | ModuleApiError::RegisterVersion(RegisterVersionError::NotRegistered(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            ModuleApiError::Create(CreateModuleError::Duplicate(_))
            | ModuleApiError::Run(RunModuleError::ModuleDisabled(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            },
            ModuleApiError::Create(
                CreateModuleError::SourceTypeNotFound(_) | CreateModuleError::CollectionNotFound(_),
            )
            | ModuleApiError::RegisterVersion(RegisterVersionError::ModuleNotFound(_))
            | ModuleApiError::Run(
                RunModuleError::ModuleNotFound(_)
                | RunModuleError::CollectionNotFound(_)
                | RunModuleError::Processing(ProcessingError::Database(DbError::NotFound(_))),
            )
            | ModuleApiError::Delete(DbError::NotFound(_))
            | ModuleApiError::Documents(
                VersionDocumentsError::VersionNotFound(_)
                | VersionDocumentsError::CollectionNotFound(_),
            ) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ModuleApiError::Run(RunModuleError::Processing(ProcessingError::Disabled)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROCESSING_DISABLED")
            },
            _ => {
                tracing::error!("Modules API error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                return error.into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };
        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}
