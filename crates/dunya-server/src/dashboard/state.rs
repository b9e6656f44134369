//! Import state machine for collections, releases and files
//!
//! State is append-only: every change inserts a new row and the current state
//! is the newest row. Collections go through a scan before import; releases
//! and files only import.
//!
//! ```text
//! collection: NotStarted -> Scanning -> Scanned -> Importing -> Finished
//! release/file:             NotStarted -> Importing -> Finished
//! ```
//!
//! Error is reachable from every state. A scanned, finished or failed
//! collection can be scanned again; a finished or failed release/file can be
//! imported again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raised when a stored code is unknown or a transition is not allowed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Unknown state code '{0}'")]
    UnknownCode(String),
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("No state recorded")]
    Missing,
}

/// Behaviour shared by the collection and release/file state enums
pub trait ImportState: Copy + Eq + std::fmt::Debug {
    fn code(self) -> &'static str;
    fn from_code(code: &str) -> Result<Self, StateError>;
    fn name(self) -> &'static str;
    fn can_transition_to(self, next: Self) -> bool;

    /// Validate a transition, returning the new state
    fn transition(self, next: Self) -> Result<Self, StateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateError::InvalidTransition {
                from: self.name(),
                to: next.name(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    NotStarted,
    Scanning,
    Scanned,
    Importing,
    Finished,
    Error,
}

impl CollectionState {
    /// Colour used by the dashboard for the collection list
    pub fn colour(self) -> Option<&'static str> {
        match self {
            CollectionState::NotStarted => Some("red"),
            CollectionState::Scanning => Some("yellow"),
            CollectionState::Finished => Some("green"),
            _ => None,
        }
    }
}

impl ImportState for CollectionState {
    fn code(self) -> &'static str {
        match self {
            CollectionState::NotStarted => "n",
            CollectionState::Scanning => "s",
            CollectionState::Scanned => "d",
            CollectionState::Importing => "i",
            CollectionState::Finished => "f",
            CollectionState::Error => "e",
        }
    }

    fn from_code(code: &str) -> Result<Self, StateError> {
        match code.trim() {
            "n" => Ok(CollectionState::NotStarted),
            "s" => Ok(CollectionState::Scanning),
            "d" => Ok(CollectionState::Scanned),
            "i" => Ok(CollectionState::Importing),
            "f" => Ok(CollectionState::Finished),
            "e" => Ok(CollectionState::Error),
            other => Err(StateError::UnknownCode(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            CollectionState::NotStarted => "Not started",
            CollectionState::Scanning => "Scanning",
            CollectionState::Scanned => "Scanned",
            CollectionState::Importing => "Importing",
            CollectionState::Finished => "Finished",
            CollectionState::Error => "Error",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use CollectionState::*;
        matches!(
            (self, next),
            (_, Error)
                | (NotStarted | Scanned | Finished | Error, Scanning)
                | (Scanning, Scanned)
                | (Scanned | Finished, Importing)
                | (Importing, Finished)
        )
    }
}

/// State of a release or a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    NotStarted,
    Importing,
    Finished,
    Error,
}

impl ImportState for ItemState {
    fn code(self) -> &'static str {
        match self {
            ItemState::NotStarted => "n",
            ItemState::Importing => "i",
            ItemState::Finished => "f",
            ItemState::Error => "e",
        }
    }

    fn from_code(code: &str) -> Result<Self, StateError> {
        match code.trim() {
            "n" => Ok(ItemState::NotStarted),
            "i" => Ok(ItemState::Importing),
            "f" => Ok(ItemState::Finished),
            "e" => Ok(ItemState::Error),
            other => Err(StateError::UnknownCode(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ItemState::NotStarted => "Not started",
            ItemState::Importing => "Importing",
            ItemState::Finished => "Finished",
            ItemState::Error => "Error",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (_, Error) | (NotStarted | Finished | Error, Importing) | (Importing, Finished)
        )
    }
}

/// A stored state row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StateRow {
    pub id: i64,
    pub state: String,
    pub state_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateEntry<S> {
    pub state: S,
    pub name: &'static str,
    pub state_date: DateTime<Utc>,
}

/// Current state plus everything before it, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateHistory<S> {
    pub current: StateEntry<S>,
    pub previous: Vec<StateEntry<S>>,
}

impl<S: ImportState> StateHistory<S> {
    /// Order rows newest first (by date, then insertion order) and split off
    /// the current state.
    pub fn from_rows(mut rows: Vec<StateRow>) -> Result<Self, StateError> {
        rows.sort_by(|a, b| b.state_date.cmp(&a.state_date).then(b.id.cmp(&a.id)));

        let mut entries = rows
            .into_iter()
            .map(|row| {
                let state = S::from_code(&row.state)?;
                Ok(StateEntry {
                    state,
                    name: state.name(),
                    state_date: row.state_date,
                })
            })
            .collect::<Result<Vec<_>, StateError>>()?;

        if entries.is_empty() {
            return Err(StateError::Missing);
        }
        let current = entries.remove(0);

        Ok(Self {
            current,
            previous: entries,
        })
    }

    pub fn has_previous_state(&self) -> bool {
        !self.previous.is_empty()
    }
}

/// A collection can finish once every one of its releases has finished.
pub fn status_can_finish(release_states: &[ItemState]) -> bool {
    release_states.iter().all(|s| *s == ItemState::Finished)
}
