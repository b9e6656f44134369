//! Register an analysis module
//!
//! The module must be compiled into this server: its slug, name, version,
//! source type and dependency all come from the [`ModuleRegistry`] entry.
//! The first version is recorded together with the module.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::docserver::{find_collection_by_slug, find_source_type, ModuleRow};
use crate::db::DbError;
use crate::docserver::layout::RESERVED_SLUGS;
use crate::features::shared::is_unique_violation;
use crate::processing::ModuleRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleCommand {
    /// Dotted module path, e.g. `dunya.filehash.FileHash`
    pub module: String,

    /// Slugs of the collections the module runs on
    #[serde(default)]
    pub collections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub module: String,
    pub depends: Option<String>,
    pub source_type: String,
    pub version_id: Uuid,
    pub version: String,
    pub collections: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateModuleError {
    #[error("Module path is required")]
    ModuleRequired,

    #[error("Module '{0}' is not available on this server")]
    NotRegistered(String),

    #[error("Module slug '{0}' is reserved")]
    ReservedSlug(String),

    #[error("Source file type '{0}' not found")]
    SourceTypeNotFound(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Module '{0}' is already registered")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<CreateModuleResponse, CreateModuleError>> for CreateModuleCommand {}

impl crate::cqrs::middleware::Command for CreateModuleCommand {}

impl CreateModuleCommand {
    #[tracing::instrument(skip(self), fields(module = %self.module))]
    pub fn validate(&self) -> Result<(), CreateModuleError> {
        if self.module.trim().is_empty() {
            return Err(CreateModuleError::ModuleRequired);
        }
        Ok(())
    }
}

/// Derived files are served at `/docserver/by-id/<mbid>/<slug>`, which
/// must not collide with the fixed routes under the same prefix.
pub fn check_slug(slug: &str) -> Result<(), CreateModuleError> {
    if RESERVED_SLUGS.contains(&slug) {
        return Err(CreateModuleError::ReservedSlug(slug.to_string()));
    }
    Ok(())
}

#[tracing::instrument(skip(pool, registry, command), fields(module = %command.module))]
pub async fn handle(
    pool: PgPool,
    registry: &ModuleRegistry,
    command: CreateModuleCommand,
) -> Result<CreateModuleResponse, CreateModuleError> {
    command.validate()?;

    let analysis = registry
        .get(command.module.trim())
        .ok_or_else(|| CreateModuleError::NotRegistered(command.module.clone()))?;
    check_slug(analysis.slug())?;
    let source_type = find_source_type(&pool, analysis.source_type())
        .await?
        .ok_or_else(|| CreateModuleError::SourceTypeNotFound(analysis.source_type().to_string()))?;

    let mut collection_ids = Vec::with_capacity(command.collections.len());
    for slug in &command.collections {
        let collection = find_collection_by_slug(&pool, slug)
            .await?
            .ok_or_else(|| CreateModuleError::CollectionNotFound(slug.clone()))?;
        collection_ids.push(collection.id);
    }

    let mut tx = pool.begin().await?;

    let module = sqlx::query_as::<_, ModuleRow>(
        "INSERT INTO modules (name, slug, depends, module, source_type_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, slug, depends, module, source_type_id, disabled",
    )
    .bind(analysis.name())
    .bind(analysis.slug())
    .bind(analysis.depends())
    .bind(analysis.module_path())
    .bind(source_type.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CreateModuleError::Duplicate(analysis.module_path().to_string())
        } else {
            CreateModuleError::Database(e)
        }
    })?;

    for collection_id in &collection_ids {
        sqlx::query(
            "INSERT INTO module_collections (module_id, collection_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(module.id)
        .bind(collection_id)
        .execute(&mut *tx)
        .await?;
    }

    let version_id: Uuid = sqlx::query_scalar(
        "INSERT INTO module_versions (module_id, version) VALUES ($1, $2) RETURNING id",
    )
    .bind(module.id)
    .bind(analysis.version())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(module_id = %module.id, slug = %module.slug, "Module registered");
    Ok(CreateModuleResponse {
        id: module.id,
        name: module.name,
        slug: module.slug,
        module: module.module,
        depends: module.depends,
        source_type: source_type.slug,
        version_id,
        version: analysis.version().to_string(),
        collections: command.collections,
    })
}
