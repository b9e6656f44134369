//! Analysis modules: registration, versions, runs and deletion

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateModuleCommand, CreateModuleError, CreateModuleResponse, DeleteModuleCommand,
    DeleteVersionCommand, RegisterVersionCommand, RegisterVersionError, RegisterVersionResponse,
    RunModuleCommand, RunModuleError,
};
pub use queries::{
    ListModulesError, ListModulesQuery, ModuleListItem, VersionDocumentsError,
    VersionDocumentsQuery,
};
pub use routes::modules_routes;
