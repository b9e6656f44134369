//! Analysis hosts and the tool versions recorded as output provenance

pub mod commands;
pub mod queries;
pub mod routes;
pub mod state;

pub use commands::{
    EssentiaBuild, PycompmusicBuild, RegisterWorkerCommand, RegisterWorkerError,
    SetWorkerUpdatingCommand, SetWorkerUpdatingError,
};
pub use queries::{ListWorkersError, ListWorkersQuery, WorkerListItem};
pub use routes::workers_routes;
pub use state::{WorkerResponse, WorkerRow, WorkerState};
