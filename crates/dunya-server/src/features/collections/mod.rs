//! Docserver collections: creation, permission tiers and listing

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateCollectionCommand, CreateCollectionError, CreateCollectionResponse,
    SetCollectionPermissionCommand, SetCollectionPermissionError, SetCollectionPermissionResponse,
};
pub use queries::{
    CollectionDocument, CollectionListItem, GetCollectionError, GetCollectionQuery,
    GetCollectionResponse, ListCollectionsError, ListCollectionsQuery,
};
pub use routes::collections_routes;
