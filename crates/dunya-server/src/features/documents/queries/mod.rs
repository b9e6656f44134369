pub mod get;
pub mod list_logs;

pub use get::{DocumentDetail, GetDocumentError, GetDocumentQuery};
pub use list_logs::{ListLogMessagesError, ListLogMessagesQuery};
