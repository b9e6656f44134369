pub mod register;
pub mod set_updating;

pub use register::{EssentiaBuild, PycompmusicBuild, RegisterWorkerCommand, RegisterWorkerError};
pub use set_updating::{SetWorkerUpdatingCommand, SetWorkerUpdatingError};
