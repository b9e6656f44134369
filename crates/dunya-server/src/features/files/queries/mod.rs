pub mod download;
pub mod resolve;

pub use download::{DownloadFileQuery, DownloadPlan};
pub use resolve::{ResolveFileError, ResolveFileQuery, ResolveFileResponse};
