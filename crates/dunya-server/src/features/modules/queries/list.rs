use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListModulesQuery {}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ModuleListItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub module: String,
    pub depends: Option<String>,
    pub disabled: bool,
    pub source_type: String,
    pub latest_version: Option<String>,
    pub latest_version_added: Option<DateTime<Utc>>,
    pub num_versions: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListModulesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<ModuleListItem>, ListModulesError>> for ListModulesQuery {}

impl crate::cqrs::middleware::Query for ListModulesQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: ListModulesQuery,
) -> Result<Vec<ModuleListItem>, ListModulesError> {
    let modules = sqlx::query_as::<_, ModuleListItem>(
        "SELECT m.id, m.name, m.slug, m.module, m.depends, m.disabled,
                st.slug AS source_type,
                latest.version AS latest_version,
                latest.date_added AS latest_version_added,
                (SELECT COUNT(*) FROM module_versions mv WHERE mv.module_id = m.id) AS num_versions
         FROM modules m
         JOIN source_file_types st ON st.id = m.source_type_id
         LEFT JOIN LATERAL (
             SELECT mv.version, mv.date_added FROM module_versions mv
             WHERE mv.module_id = m.id
             ORDER BY mv.date_added DESC
             LIMIT 1
         ) latest ON TRUE
         ORDER BY m.slug",
    )
    .fetch_all(&pool)
    .await?;
    Ok(modules)
}
