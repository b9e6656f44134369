pub mod add_log;
pub mod add_source_file;
pub mod create;

pub use add_log::{AddLogMessageCommand, AddLogMessageError};
pub use add_source_file::{AddSourceFileCommand, AddSourceFileError, AddSourceFileResponse};
pub use create::{CreateDocumentCommand, CreateDocumentError, CreateDocumentResponse};
