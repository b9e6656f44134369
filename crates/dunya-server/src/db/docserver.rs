//! Docserver queries shared between feature slices and the processing
//! dispatcher.
//!
//! The loaders here turn rows into the plain candidate types of
//! [`crate::docserver`], which then make the actual decisions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dunya_common::types::PermissionTier;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::DbResult;
use crate::docserver::access::{Grant, SlugKind};
use crate::docserver::derived_map::DerivedRow;
use crate::docserver::layout;
use crate::docserver::resolver::{
    DerivedCandidate, PartCandidate, SlugTarget, SourceCandidate, VersionCandidate,
};

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CollectionRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub root_directory: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SourceTypeRow {
    pub id: Uuid,
    pub slug: String,
    pub extension: String,
    pub name: String,
    pub mimetype: String,
    pub stype: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub title: String,
    pub external_identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ModuleRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub depends: Option<String>,
    pub module: String,
    pub source_type_id: Uuid,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ModuleVersionRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub version: String,
    pub date_added: DateTime<Utc>,
}

/// A source file together with where it lives on disk
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceFileRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub path: String,
    pub size: i64,
    pub extension: String,
    pub mimetype: String,
    pub stype: String,
    /// Root of the document's first collection
    pub root_directory: Option<String>,
}

impl SourceFileRow {
    pub fn full_path(&self) -> PathBuf {
        match self.root_directory {
            Some(ref root) => layout::source_type_root(Path::new(root), &self.stype).join(&self.path),
            None => PathBuf::from(&self.path),
        }
    }
}

// ============================================================================
// Lookups
// ============================================================================

pub async fn find_collection_by_slug(pool: &PgPool, slug: &str) -> DbResult<Option<CollectionRow>> {
    let row = sqlx::query_as::<_, CollectionRow>(
        "SELECT id, name, slug, description, root_directory, created_at
         FROM collections WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_document(pool: &PgPool, external_id: &str) -> DbResult<Option<DocumentRow>> {
    let row = sqlx::query_as::<_, DocumentRow>(
        "SELECT id, title, external_identifier FROM documents WHERE external_identifier = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Collections of a document, in the order it was added to them
pub async fn document_collections(pool: &PgPool, document_id: Uuid) -> DbResult<Vec<CollectionRow>> {
    let rows = sqlx::query_as::<_, CollectionRow>(
        "SELECT c.id, c.name, c.slug, c.description, c.root_directory, c.created_at
         FROM collections c
         JOIN collection_documents cd ON cd.collection_id = c.id
         WHERE cd.document_id = $1
         ORDER BY cd.added_at, c.slug",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_source_type(pool: &PgPool, slug: &str) -> DbResult<Option<SourceTypeRow>> {
    let row = sqlx::query_as::<_, SourceTypeRow>(
        "SELECT id, slug, extension, name, mimetype, stype FROM source_file_types WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_module(pool: &PgPool, id: Uuid) -> DbResult<Option<ModuleRow>> {
    let row = sqlx::query_as::<_, ModuleRow>(
        "SELECT id, name, slug, depends, module, source_type_id, disabled
         FROM modules WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_module_by_slug(pool: &PgPool, slug: &str) -> DbResult<Option<ModuleRow>> {
    let row = sqlx::query_as::<_, ModuleRow>(
        "SELECT id, name, slug, depends, module, source_type_id, disabled
         FROM modules WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_module_version(pool: &PgPool, id: Uuid) -> DbResult<Option<ModuleVersionRow>> {
    let row = sqlx::query_as::<_, ModuleVersionRow>(
        "SELECT id, module_id, version, date_added FROM module_versions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The most recently added version of a module
pub async fn latest_version(pool: &PgPool, module_id: Uuid) -> DbResult<Option<ModuleVersionRow>> {
    let row = sqlx::query_as::<_, ModuleVersionRow>(
        "SELECT id, module_id, version, date_added FROM module_versions
         WHERE module_id = $1
         ORDER BY date_added DESC, id DESC
         LIMIT 1",
    )
    .bind(module_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The first source file of a type for a document
pub async fn source_file_of_type(
    pool: &PgPool,
    document_id: Uuid,
    source_type_id: Uuid,
) -> DbResult<Option<SourceFileRow>> {
    let rows = source_files(pool, document_id, Some(source_type_id)).await?;
    Ok(rows.into_iter().next())
}

/// Source files of a document, optionally limited to one type
pub async fn source_files(
    pool: &PgPool,
    document_id: Uuid,
    source_type_id: Option<Uuid>,
) -> DbResult<Vec<SourceFileRow>> {
    let rows = sqlx::query_as::<_, SourceFileRow>(
        "SELECT sf.id, sf.document_id, sf.path, sf.size, st.extension, st.mimetype, st.stype,
                (SELECT c.root_directory
                   FROM collection_documents cd
                   JOIN collections c ON c.id = cd.collection_id
                  WHERE cd.document_id = sf.document_id
                  ORDER BY cd.added_at
                  LIMIT 1) AS root_directory
         FROM source_files sf
         JOIN source_file_types st ON st.id = sf.file_type_id
         WHERE sf.document_id = $1 AND ($2::uuid IS NULL OR sf.file_type_id = $2)
         ORDER BY st.slug",
    )
    .bind(document_id)
    .bind(source_type_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ============================================================================
// Access control
// ============================================================================

#[derive(sqlx::FromRow)]
struct GrantRow {
    collection_id: Uuid,
    permission: String,
    streamable: bool,
}

/// Permission rows for a file type on every collection the document is in
pub async fn grants_for(
    pool: &PgPool,
    document_id: Uuid,
    source_type_id: Uuid,
) -> DbResult<Vec<Grant>> {
    let rows = sqlx::query_as::<_, GrantRow>(
        "SELECT cp.collection_id, cp.permission, cp.streamable
         FROM collection_permissions cp
         JOIN collection_documents cd ON cd.collection_id = cp.collection_id
         WHERE cd.document_id = $1 AND cp.source_type_id = $2",
    )
    .bind(document_id)
    .bind(source_type_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match row.permission.parse::<PermissionTier>() {
            Ok(permission) => Some(Grant {
                collection_id: row.collection_id,
                permission,
                streamable: row.streamable,
            }),
            Err(e) => {
                tracing::warn!(collection_id = %row.collection_id, error = %e, "Skipping bad permission row");
                None
            },
        })
        .collect())
}

// ============================================================================
// Resolver input
// ============================================================================

/// Everything the resolver and the access check need for one slug
#[derive(Debug, Clone)]
pub struct LoadedTarget {
    pub kind: SlugKind,
    pub source_type_id: Option<Uuid>,
    pub target: SlugTarget,
}

#[derive(sqlx::FromRow)]
struct DerivedFileRow {
    id: Uuid,
    module_version_id: Uuid,
    outputname: String,
    extension: String,
    mimetype: String,
}

#[derive(sqlx::FromRow)]
struct PartRow {
    derived_file_id: Uuid,
    part_order: i32,
    path: String,
    size: i64,
}

/// Load the candidates a slug can resolve to for one document.
///
/// Source type slugs take precedence over module slugs.
pub async fn load_slug_target(
    pool: &PgPool,
    document_id: Uuid,
    slug: &str,
    audio_root: &Path,
) -> DbResult<LoadedTarget> {
    if let Some(source_type) = find_source_type(pool, slug).await? {
        let files = source_files(pool, document_id, Some(source_type.id))
            .await?
            .into_iter()
            .map(|f| SourceCandidate {
                full_path: f.full_path(),
                extension: f.extension,
                mimetype: f.mimetype,
                size: f.size,
            })
            .collect();
        return Ok(LoadedTarget {
            kind: SlugKind::SourceType,
            source_type_id: Some(source_type.id),
            target: SlugTarget::SourceType(files),
        });
    }

    let module = match find_module_by_slug(pool, slug).await? {
        Some(module) => module,
        None => {
            return Ok(LoadedTarget {
                kind: SlugKind::Unknown,
                source_type_id: None,
                target: SlugTarget::Unknown,
            })
        },
    };

    let versions = sqlx::query_as::<_, ModuleVersionRow>(
        "SELECT id, module_id, version, date_added FROM module_versions WHERE module_id = $1",
    )
    .bind(module.id)
    .fetch_all(pool)
    .await?;

    let derived = sqlx::query_as::<_, DerivedFileRow>(
        "SELECT df.id, df.module_version_id, df.outputname, df.extension, df.mimetype
         FROM derived_files df
         JOIN module_versions mv ON mv.id = df.module_version_id
         WHERE df.document_id = $1 AND mv.module_id = $2
         ORDER BY df.outputname",
    )
    .bind(document_id)
    .bind(module.id)
    .fetch_all(pool)
    .await?;

    let parts = sqlx::query_as::<_, PartRow>(
        "SELECT p.derived_file_id, p.part_order, p.path, p.size
         FROM derived_file_parts p
         JOIN derived_files df ON df.id = p.derived_file_id
         JOIN module_versions mv ON mv.id = df.module_version_id
         WHERE df.document_id = $1 AND mv.module_id = $2
         ORDER BY p.part_order",
    )
    .bind(document_id)
    .bind(module.id)
    .fetch_all(pool)
    .await?;

    let mut parts_by_file: HashMap<Uuid, Vec<PartCandidate>> = HashMap::new();
    for part in parts {
        parts_by_file
            .entry(part.derived_file_id)
            .or_default()
            .push(PartCandidate {
                part_order: part.part_order,
                full_path: audio_root.join(&part.path),
                size: part.size,
            });
    }

    let mut derived_by_version: HashMap<Uuid, Vec<DerivedCandidate>> = HashMap::new();
    for file in derived {
        derived_by_version
            .entry(file.module_version_id)
            .or_default()
            .push(DerivedCandidate {
                parts: parts_by_file.remove(&file.id).unwrap_or_default(),
                outputname: file.outputname,
                extension: file.extension,
                mimetype: file.mimetype,
            });
    }

    let versions = versions
        .into_iter()
        .map(|v| VersionCandidate {
            derived: derived_by_version.remove(&v.id).unwrap_or_default(),
            version: v.version,
            date_added: v.date_added,
        })
        .collect();

    Ok(LoadedTarget {
        kind: SlugKind::Module,
        source_type_id: None,
        target: SlugTarget::Module {
            slug: module.slug,
            versions,
        },
    })
}

/// Derived file summary rows for a document, oldest version first
pub async fn derived_rows(pool: &PgPool, document_id: Uuid) -> DbResult<Vec<DerivedRow>> {
    let rows = sqlx::query_as::<_, DerivedRow>(
        "SELECT m.slug AS module_slug, df.outputname, df.extension, df.mimetype,
                (SELECT COUNT(*) FROM derived_file_parts p WHERE p.derived_file_id = df.id) AS numparts,
                mv.version
         FROM derived_files df
         JOIN module_versions mv ON mv.id = df.module_version_id
         JOIN modules m ON m.id = mv.module_id
         WHERE df.document_id = $1
         ORDER BY mv.date_added, mv.id, df.outputname",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ============================================================================
// Module runs
// ============================================================================

/// Documents a module version applies to, split by whether the version has
/// already produced output for them.
///
/// A document applies when it has a source file of the module's source type
/// and belongs to `collection`, or to one of the module's collections when no
/// collection is given.
pub async fn documents_for_version(
    pool: &PgPool,
    version_id: Uuid,
    collection_id: Option<Uuid>,
    processed: bool,
) -> DbResult<Vec<DocumentRow>> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT DISTINCT d.id, d.title, d.external_identifier
         FROM documents d
         JOIN collection_documents cd ON cd.document_id = d.id
         JOIN module_versions mv ON mv.id = $1
         JOIN modules m ON m.id = mv.module_id
         JOIN source_files sf ON sf.document_id = d.id AND sf.file_type_id = m.source_type_id
         WHERE (($2::uuid IS NULL AND cd.collection_id IN
                    (SELECT mc.collection_id FROM module_collections mc WHERE mc.module_id = m.id))
                OR cd.collection_id = $2)
           AND EXISTS (SELECT 1 FROM derived_files df
                        WHERE df.document_id = d.id AND df.module_version_id = mv.id) = $3
         ORDER BY d.title, d.id",
    )
    .bind(version_id)
    .bind(collection_id)
    .bind(processed)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ============================================================================
// Document log
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentLogRow {
    pub id: Uuid,
    pub level: String,
    pub message: String,
    pub module_version_id: Option<Uuid>,
    pub source_file_id: Option<Uuid>,
    pub datetime: DateTime<Utc>,
}

/// Append a message to a document's processing log
pub async fn add_document_log<'e, E>(
    executor: E,
    document_id: Uuid,
    level: &str,
    message: &str,
    module_version_id: Option<Uuid>,
    source_file_id: Option<Uuid>,
) -> DbResult<DocumentLogRow>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, DocumentLogRow>(
        "INSERT INTO document_log_messages
             (document_id, level, message, module_version_id, source_file_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, level, message, module_version_id, source_file_id, datetime",
    )
    .bind(document_id)
    .bind(level)
    .bind(message)
    .bind(module_version_id)
    .bind(source_file_id)
    .fetch_one(executor)
    .await?;
    Ok(row)
}
