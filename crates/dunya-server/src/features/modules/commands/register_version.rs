//! Record the version the server's build of a module reports
//!
//! Idempotent: registering a version that is already known returns it with
//! `created = false`.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{find_module, ModuleVersionRow};
use crate::db::DbError;
use crate::processing::ModuleRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterVersionCommand {
    pub module_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterVersionResponse {
    #[serde(flatten)]
    pub version: ModuleVersionRow,
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterVersionError {
    #[error("Module {0} not found")]
    ModuleNotFound(Uuid),

    #[error("Module '{0}' is not available on this server")]
    NotRegistered(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<RegisterVersionResponse, RegisterVersionError>> for RegisterVersionCommand {}

impl crate::cqrs::middleware::Command for RegisterVersionCommand {}

#[tracing::instrument(skip(pool, registry), fields(module_id = %command.module_id))]
pub async fn handle(
    pool: PgPool,
    registry: &ModuleRegistry,
    command: RegisterVersionCommand,
) -> Result<RegisterVersionResponse, RegisterVersionError> {
    let module = find_module(&pool, command.module_id)
        .await?
        .ok_or(RegisterVersionError::ModuleNotFound(command.module_id))?;
    let analysis = registry
        .get(&module.module)
        .ok_or_else(|| RegisterVersionError::NotRegistered(module.module.clone()))?;

    let inserted = sqlx::query_as::<_, ModuleVersionRow>(
        "INSERT INTO module_versions (module_id, version) VALUES ($1, $2)
         ON CONFLICT (module_id, version) DO NOTHING
         RETURNING id, module_id, version, date_added",
    )
    .bind(module.id)
    .bind(analysis.version())
    .fetch_optional(&pool)
    .await?;

    let created = inserted.is_some();
    let version = match inserted {
        Some(version) => version,
        None => {
            sqlx::query_as::<_, ModuleVersionRow>(
                "SELECT id, module_id, version, date_added FROM module_versions
                 WHERE module_id = $1 AND version = $2",
            )
            .bind(module.id)
            .bind(analysis.version())
            .fetch_one(&pool)
            .await?
        },
    };

    if created {
        tracing::info!(slug = %module.slug, version = %version.version, "New module version");
    }
    Ok(RegisterVersionResponse { version, created })
}
