//! Worker routes (staff only)
//!
//! - `POST /docserver/workers` - Register a host and its tool versions
//! - `GET /docserver/workers` - List hosts
//! - `PUT /docserver/workers/:hostname/updating` - Mark a host as updating

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
        RegisterWorkerCommand, RegisterWorkerError, SetWorkerUpdatingCommand,
        SetWorkerUpdatingError,
    },
    queries::{ListWorkersError, ListWorkersQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::middleware::StaffUser;

pub fn workers_routes() -> Router<PgPool> {
    Router::new()
        .route("/workers", get(list_workers).post(register_worker))
        .route("/workers/:hostname/updating", put(set_updating))
}

/// Register a worker
///
/// # Endpoint
///
/// `POST /docserver/workers`
///
/// ```json
/// {
///   "hostname": "kora",
///   "essentia": { "version": "2.1-beta2", "sha1": "...", "commit_date": "2024-01-02T00:00:00Z" },
///   "pycompmusic": { "sha1": "...", "commit_date": "2024-01-02T00:00:00Z" }
/// }
/// ```
#[tracing::instrument(skip(pool, _staff, command), fields(hostname = %command.hostname))]
async fn register_worker(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Json(command): Json<RegisterWorkerCommand>,
) -> Result<Response, WorkerApiError> {
    let worker = super::commands::register::handle(pool, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(worker))).into_response())
}

#[tracing::instrument(skip(pool, _staff))]
async fn set_updating(
    State(pool): State<PgPool>,
    _staff: StaffUser,
    Path(hostname): Path<String>,
) -> Result<Response, WorkerApiError> {
    let worker =
        super::commands::set_updating::handle(pool, SetWorkerUpdatingCommand { hostname }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(worker))).into_response())
}

#[tracing::instrument(skip(pool, _staff))]
async fn list_workers(
    State(pool): State<PgPool>,
    _staff: StaffUser,
) -> Result<Response, WorkerApiError> {
    let workers = super::queries::list::handle(pool, ListWorkersQuery {}).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(workers))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum WorkerApiError {
    #[error(transparent)]
    Register(#[from] RegisterWorkerError),
    #[error(transparent)]
    SetUpdating(#[from] SetWorkerUpdatingError),
    #[error(transparent)]
    List(#[from] ListWorkersError),
}

impl IntoResponse for WorkerApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            WorkerApiError::Register(
                RegisterWorkerError::HostnameRequired
                | RegisterWorkerError::EssentiaVersionRequired
                | RegisterWorkerError::InvalidSha1(_),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            WorkerApiError::SetUpdating(SetWorkerUpdatingError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            _ => {
                tracing::error!("Database error in workers API: {}", self);
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
        let response = WorkerApiError::from(RegisterWorkerError::InvalidSha1("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            WorkerApiError::from(SetWorkerUpdatingError::NotFound("kora".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
