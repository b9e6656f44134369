pub mod create;
pub mod delete;
pub mod register_version;
pub mod run;

pub use create::{CreateModuleCommand, CreateModuleError, CreateModuleResponse};
pub use delete::{DeleteModuleCommand, DeleteVersionCommand};
pub use register_version::{RegisterVersionCommand, RegisterVersionError, RegisterVersionResponse};
pub use run::{RunModuleCommand, RunModuleError};
