//! Docserver documents, their source files and processing logs

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    AddLogMessageCommand, AddLogMessageError, AddSourceFileCommand, AddSourceFileError,
    AddSourceFileResponse, CreateDocumentCommand, CreateDocumentError, CreateDocumentResponse,
};
pub use queries::{
    DocumentDetail, GetDocumentError, GetDocumentQuery, ListLogMessagesError, ListLogMessagesQuery,
};
pub use routes::documents_routes;
