pub mod create;
pub mod set_permission;

pub use create::{CreateCollectionCommand, CreateCollectionError, CreateCollectionResponse};
pub use set_permission::{
    SetCollectionPermissionCommand, SetCollectionPermissionError, SetCollectionPermissionResponse,
};
