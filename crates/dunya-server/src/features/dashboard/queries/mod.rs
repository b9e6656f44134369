pub mod get_collection;
pub mod get_file;
pub mod get_release;
pub mod list;

pub use get_collection::{
    CollectionOverview, GetDashboardCollectionError, GetDashboardCollectionQuery,
    UnmatchedDirectory,
};
pub use get_file::{FileDetail, GetFileError, GetFileQuery};
pub use get_release::{CheckerHistory, GetReleaseError, GetReleaseQuery, ReleaseDetail};
pub use list::{
    DashboardCollectionItem, ListDashboardCollectionsError, ListDashboardCollectionsQuery,
};
