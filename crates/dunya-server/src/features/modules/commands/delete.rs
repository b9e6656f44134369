//! Delete a module or one of its versions, including all derived output

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DbError;
use crate::processing::{DeleteSummary, Processor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteModuleCommand {
    pub module_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVersionCommand {
    pub version_id: Uuid,
}

impl Request<Result<DeleteSummary, DbError>> for DeleteModuleCommand {}
impl Request<Result<DeleteSummary, DbError>> for DeleteVersionCommand {}

impl crate::cqrs::middleware::Command for DeleteModuleCommand {}
impl crate::cqrs::middleware::Command for DeleteVersionCommand {}

#[tracing::instrument(skip(processor), fields(module_id = %command.module_id))]
pub async fn handle_module(
    processor: &Processor,
    command: DeleteModuleCommand,
) -> Result<DeleteSummary, DbError> {
    processor.delete_module(command.module_id).await
}

#[tracing::instrument(skip(processor), fields(version_id = %command.version_id))]
pub async fn handle_version(
    processor: &Processor,
    command: DeleteVersionCommand,
) -> Result<DeleteSummary, DbError> {
    processor.delete_module_version(command.version_id).await
}
