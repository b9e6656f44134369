//! Register an analysis host and the tool versions it runs
//!
//! Version rows are shared between hosts: an essentia build is identified by
//! (version, sha1), a pycompmusic checkout by its sha1. Registering marks the
//! worker Updated.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::super::{WorkerResponse, WorkerRow, WorkerState};
use crate::features::shared::validation::validate_sha1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssentiaBuild {
    pub version: String,
    pub sha1: String,
    pub commit_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PycompmusicBuild {
    pub sha1: String,
    pub commit_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerCommand {
    pub hostname: String,
    pub essentia: EssentiaBuild,
    pub pycompmusic: PycompmusicBuild,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterWorkerError {
    #[error("Hostname is required")]
    HostnameRequired,

    #[error("Essentia version is required")]
    EssentiaVersionRequired,

    #[error("Invalid commit hash '{0}': expected 40 hex characters")]
    InvalidSha1(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<WorkerResponse, RegisterWorkerError>> for RegisterWorkerCommand {}

impl crate::cqrs::middleware::Command for RegisterWorkerCommand {}

impl RegisterWorkerCommand {
    pub fn validate(&self) -> Result<(), RegisterWorkerError> {
        if self.hostname.trim().is_empty() {
            return Err(RegisterWorkerError::HostnameRequired);
        }
        if self.essentia.version.trim().is_empty() {
            return Err(RegisterWorkerError::EssentiaVersionRequired);
        }
        for sha1 in [&self.essentia.sha1, &self.pycompmusic.sha1] {
            if !validate_sha1(sha1) {
                return Err(RegisterWorkerError::InvalidSha1(sha1.clone()));
            }
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(hostname = %command.hostname))]
pub async fn handle(
    pool: PgPool,
    command: RegisterWorkerCommand,
) -> Result<WorkerResponse, RegisterWorkerError> {
    command.validate()?;

    let mut tx = pool.begin().await?;
    let essentia_id = essentia_version(&mut tx, &command.essentia).await?;
    let pycompmusic_id = pycompmusic_version(&mut tx, &command.pycompmusic).await?;

    let worker = sqlx::query_as::<_, WorkerRow>(
        "INSERT INTO workers (hostname, essentia_id, pycompmusic_id, state)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (hostname) DO UPDATE
             SET essentia_id = EXCLUDED.essentia_id,
                 pycompmusic_id = EXCLUDED.pycompmusic_id,
                 state = EXCLUDED.state
         RETURNING id, hostname, essentia_id, pycompmusic_id, state",
    )
    .bind(command.hostname.trim())
    .bind(essentia_id)
    .bind(pycompmusic_id)
    .bind(WorkerState::Updated.code())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    let worker = WorkerResponse::from(worker);

    tracing::info!(
        worker_id = %worker.id,
        essentia = %command.essentia.version,
        "Worker registered"
    );
    Ok(worker)
}

async fn essentia_version(
    tx: &mut Transaction<'_, Postgres>,
    build: &EssentiaBuild,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO essentia_versions (version, sha1, commit_date) VALUES ($1, $2, $3)
         ON CONFLICT (version, sha1) DO UPDATE SET version = EXCLUDED.version
         RETURNING id",
    )
    .bind(build.version.trim())
    .bind(build.sha1.to_lowercase())
    .bind(build.commit_date)
    .fetch_one(&mut **tx)
    .await
}

async fn pycompmusic_version(
    tx: &mut Transaction<'_, Postgres>,
    build: &PycompmusicBuild,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO pycompmusic_versions (sha1, commit_date) VALUES ($1, $2)
         ON CONFLICT (sha1) DO UPDATE SET sha1 = EXCLUDED.sha1
         RETURNING id",
    )
    .bind(build.sha1.to_lowercase())
    .bind(build.commit_date)
    .fetch_one(&mut **tx)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> RegisterWorkerCommand {
        RegisterWorkerCommand {
            hostname: "kora".to_string(),
            essentia: EssentiaBuild {
                version: "2.1-beta2".to_string(),
                sha1: "a".repeat(40),
                commit_date: Utc::now(),
            },
            pycompmusic: PycompmusicBuild {
                sha1: "0123456789abcdef0123456789abcdef01234567".to_string(),
                commit_date: Utc::now(),
            },
        }
    }

    #[test]
    fn test_valid_command() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_hostname_required() {
        let mut cmd = command();
        cmd.hostname = "  ".to_string();
        assert!(matches!(cmd.validate(), Err(RegisterWorkerError::HostnameRequired)));
    }

    #[test]
    fn test_sha1_checked() {
        let mut cmd = command();
        cmd.pycompmusic.sha1 = "deadbeef".to_string();
        assert!(matches!(cmd.validate(), Err(RegisterWorkerError::InvalidSha1(_))));
    }
}
