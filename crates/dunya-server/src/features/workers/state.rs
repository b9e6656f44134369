//! Worker rows and their update state

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a host runs the tool versions it last registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    New,
    Updating,
    Updated,
}

impl WorkerState {
    pub fn code(self) -> &'static str {
        match self {
            WorkerState::New => "0",
            WorkerState::Updating => "1",
            WorkerState::Updated => "2",
        }
    }

    /// Unknown codes read as New
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => WorkerState::Updating,
            "2" => WorkerState::Updated,
            _ => WorkerState::New,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkerRow {
    pub id: Uuid,
    pub hostname: String,
    pub essentia_id: Option<Uuid>,
    pub pycompmusic_id: Option<Uuid>,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerResponse {
    pub id: Uuid,
    pub hostname: String,
    pub essentia_id: Option<Uuid>,
    pub pycompmusic_id: Option<Uuid>,
    pub state: WorkerState,
}

impl From<WorkerRow> for WorkerResponse {
    fn from(row: WorkerRow) -> Self {
        Self {
            id: row.id,
            hostname: row.hostname,
            essentia_id: row.essentia_id,
            pycompmusic_id: row.pycompmusic_id,
            state: WorkerState::from_code(&row.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for state in [WorkerState::New, WorkerState::Updating, WorkerState::Updated] {
            assert_eq!(WorkerState::from_code(state.code()), state);
        }
        assert_eq!(WorkerState::from_code("x"), WorkerState::New);
    }

    #[test]
    fn test_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&WorkerState::Updating).unwrap(), "\"updating\"");
    }
}
