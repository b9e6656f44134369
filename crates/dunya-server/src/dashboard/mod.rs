//! Dashboard: collection scanning, import state and completeness checks
//!
//! This module holds the database-free part of the dashboard. Loading and
//! storing rows lives in `db::dashboard`, and the HTTP handlers in
//! `features::dashboard`.

pub mod checkers;
pub mod scanner;
pub mod state;
pub mod summary;

pub use checkers::{CheckResult, CheckerRegistry, CheckerType, CompletenessChecker};
pub use scanner::{short_path, ScannedDirectory};
pub use state::{CollectionState, ImportState, ItemState, StateError, StateHistory};
pub use summary::{ReleaseOrder, ReleaseSummary};
