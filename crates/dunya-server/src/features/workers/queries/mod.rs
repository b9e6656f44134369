pub mod list;

pub use list::{ListWorkersError, ListWorkersQuery, WorkerListItem};
