//! Queue a module run
//!
//! With `recordings`, exactly those documents are processed again. Otherwise
//! every document of `collection` (or of the module's collections) that the
//! latest version has not processed yet is queued. The run itself happens in
//! the background; the response only says how much was queued.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::docserver::{find_collection_by_slug, find_module};
use crate::db::DbError;
use crate::processing::{ProcessingError, Processor, RunSummary};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunModuleCommand {
    #[serde(skip)]
    pub module_id: Uuid,

    /// Collection slug
    #[serde(default)]
    pub collection: Option<String>,

    /// External identifiers of recordings to reprocess
    #[serde(default)]
    pub recordings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunModuleError {
    #[error("Module {0} not found")]
    ModuleNotFound(Uuid),

    #[error("Module '{0}' is disabled")]
    ModuleDisabled(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<RunSummary, RunModuleError>> for RunModuleCommand {}

impl crate::cqrs::middleware::Command for RunModuleCommand {}

#[tracing::instrument(skip(processor, command), fields(module_id = %command.module_id))]
pub async fn handle(
    processor: &Processor,
    command: RunModuleCommand,
) -> Result<RunSummary, RunModuleError> {
    let module = find_module(processor.pool(), command.module_id)
        .await?
        .ok_or(RunModuleError::ModuleNotFound(command.module_id))?;
    if module.disabled {
        return Err(RunModuleError::ModuleDisabled(module.slug));
    }

    if !command.recordings.is_empty() {
        return Ok(processor
            .run_module_on_recordings(module.id, &command.recordings)
            .await?);
    }

    let collection_id = match command.collection {
        Some(ref slug) => Some(
            find_collection_by_slug(processor.pool(), slug)
                .await?
                .ok_or_else(|| RunModuleError::CollectionNotFound(slug.clone()))?
                .id,
        ),
        None => None,
    };
    Ok(processor
        .run_module_on_collection(module.id, collection_id)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_defaults() {
        let command: RunModuleCommand = serde_json::from_str("{}").unwrap();
        assert!(command.collection.is_none());
        assert!(command.recordings.is_empty());
    }

    #[test]
    fn test_module_id_comes_from_path() {
        let command: RunModuleCommand = serde_json::from_str(
            r#"{"module_id": "8a4d3c2b-0000-0000-0000-000000000000", "recordings": ["a"]}"#,
        )
        .unwrap();
        assert_eq!(command.module_id, Uuid::nil());
        assert_eq!(command.recordings, vec!["a".to_string()]);
    }
}
