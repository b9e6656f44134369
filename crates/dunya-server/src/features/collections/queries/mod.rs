pub mod get;
pub mod list;

pub use get::{CollectionDocument, GetCollectionError, GetCollectionQuery, GetCollectionResponse};
pub use list::{CollectionListItem, ListCollectionsError, ListCollectionsQuery};
