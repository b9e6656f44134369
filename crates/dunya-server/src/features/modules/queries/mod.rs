pub mod list;
pub mod version_documents;

pub use list::{ListModulesError, ListModulesQuery, ModuleListItem};
pub use version_documents::{VersionDocumentsError, VersionDocumentsQuery};
