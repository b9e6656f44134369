pub mod create_collection;
pub mod import;
pub mod run_checkers;
pub mod scan;
pub mod set_ignore;

pub use create_collection::{
    CreateDashboardCollectionCommand, CreateDashboardCollectionError,
    CreateDashboardCollectionResponse,
};
pub use import::{ImportSummary, StartImportCommand, StartImportError};
pub use run_checkers::{CheckSummary, RunCheckersCommand, RunCheckersError};
pub use scan::{ScanCollectionCommand, ScanCollectionError, ScanSummary};
pub use set_ignore::{SetReleaseIgnoreCommand, SetReleaseIgnoreError};
