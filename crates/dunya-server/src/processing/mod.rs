//! Analysis processing
//!
//! Registered [`AnalysisModule`]s turn a document's source file into named
//! outputs. The [`Processor`] finds documents a module version has not yet
//! processed, runs the module on them with bounded concurrency and stores the
//! outputs as derived files under the audio root.
//!
//! This is an in-process dispatcher, not a durable queue: work in flight when
//! the server stops is picked up again by the next run, because unprocessed
//! documents are recomputed from the database every time.

pub mod builtin;
pub mod module;
pub mod orchestrator;

pub use module::{AnalysisModule, ModuleOutputs, ModuleRegistry, OutputData, OutputSpec};
pub use orchestrator::{DeleteSummary, Processor, Provenance, RunSummary};

use dunya_common::DunyaError;
use uuid::Uuid;

use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot serialise output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Dunya(#[from] DunyaError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Module produced undeclared output '{0}'")]
    UnknownOutput(String),

    #[error("Module produced no parts for output '{0}'")]
    EmptyOutput(String),

    #[error("Output '{0}' has several parts but is not declared multipart")]
    NotMultipart(String),

    #[error("{0}")]
    Module(String),

    #[error("Module '{0}' is not available on this server")]
    NotRegistered(String),

    #[error("Document {0} has no source file of the module's type")]
    NoSourceFile(Uuid),

    #[error("Document {0} is not in any collection")]
    NoCollection(Uuid),

    #[error("Document {0} has no external identifier")]
    NoExternalId(Uuid),

    #[error("Processing is disabled on this server")]
    Disabled,

    #[error("Processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<sqlx::Error> for ProcessingError {
    fn from(err: sqlx::Error) -> Self {
        ProcessingError::Database(DbError::Sqlx(err))
    }
}
