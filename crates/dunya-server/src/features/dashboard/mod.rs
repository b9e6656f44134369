//! Dashboard: adding collections, scanning, import and completeness results

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CheckSummary, CreateDashboardCollectionCommand, CreateDashboardCollectionError,
    CreateDashboardCollectionResponse, ImportSummary, RunCheckersCommand, RunCheckersError,
    ScanCollectionCommand, ScanCollectionError, ScanSummary, SetReleaseIgnoreCommand,
    SetReleaseIgnoreError, StartImportCommand, StartImportError,
};
pub use queries::{
    CollectionOverview, DashboardCollectionItem, FileDetail, GetDashboardCollectionError,
    GetDashboardCollectionQuery, GetFileError, GetFileQuery, GetReleaseError, GetReleaseQuery,
    ListDashboardCollectionsError, ListDashboardCollectionsQuery, ReleaseDetail,
};
pub use routes::dashboard_routes;
