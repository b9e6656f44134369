use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::dashboard::ReleaseRow;

/// Exclude a release from import, or include it again
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetReleaseIgnoreCommand {
    #[serde(skip)]
    pub release_id: Uuid,
    pub ignore: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SetReleaseIgnoreError {
    #[error("Release {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ReleaseRow, SetReleaseIgnoreError>> for SetReleaseIgnoreCommand {}

impl crate::cqrs::middleware::Command for SetReleaseIgnoreCommand {}

#[tracing::instrument(skip(pool), fields(release_id = %command.release_id))]
pub async fn handle(
    pool: PgPool,
    command: SetReleaseIgnoreCommand,
) -> Result<ReleaseRow, SetReleaseIgnoreError> {
    sqlx::query_as::<_, ReleaseRow>(
        "UPDATE musicbrainz_releases SET ignore = $2 WHERE id = $1
         RETURNING id, mbid, collection_id, title, artist, ignore",
    )
    .bind(command.release_id)
    .bind(command.ignore)
    .fetch_optional(&pool)
    .await?
    .ok_or(SetReleaseIgnoreError::NotFound(command.release_id))
}
