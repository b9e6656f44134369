//! Serving docserver files
//!
//! Resolution of (document, slug, subtype, part, version) to one file,
//! access-checked downloads and the server-side helpers built on them.

pub mod helpers;
pub mod queries;
pub mod routes;

pub use queries::{
    DownloadFileQuery, DownloadPlan, ResolveFileError, ResolveFileQuery, ResolveFileResponse,
};
pub use routes::files_routes;
