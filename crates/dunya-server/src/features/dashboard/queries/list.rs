use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dashboard::{CollectionState, ImportState, StateError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDashboardCollectionsQuery {}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCollectionItem {
    pub id: Uuid,
    pub name: String,
    pub root_directory: String,
    pub last_updated: DateTime<Utc>,
    pub do_import: bool,
    pub state: CollectionState,
    pub state_name: &'static str,
    pub colour: Option<&'static str>,
    pub num_releases: i64,
}

#[derive(sqlx::FromRow)]
struct CollectionListRow {
    id: Uuid,
    name: String,
    root_directory: String,
    last_updated: DateTime<Utc>,
    do_import: bool,
    state: Option<String>,
    num_releases: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDashboardCollectionsError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<DashboardCollectionItem>, ListDashboardCollectionsError>>
    for ListDashboardCollectionsQuery
{
}

impl crate::cqrs::middleware::Query for ListDashboardCollectionsQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: ListDashboardCollectionsQuery,
) -> Result<Vec<DashboardCollectionItem>, ListDashboardCollectionsError> {
    let rows = sqlx::query_as::<_, CollectionListRow>(
        "SELECT c.id, c.name, c.root_directory, c.last_updated, c.do_import,
                latest.state,
                (SELECT COUNT(*) FROM musicbrainz_releases r WHERE r.collection_id = c.id)
                    AS num_releases
         FROM dashboard_collections c
         LEFT JOIN LATERAL (
             SELECT s.state FROM collection_states s
             WHERE s.collection_id = c.id
             ORDER BY s.state_date DESC, s.id DESC
             LIMIT 1
         ) latest ON TRUE
         ORDER BY c.name",
    )
    .fetch_all(&pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let state = match row.state {
                Some(ref code) => CollectionState::from_code(code)?,
                None => return Err(StateError::Missing.into()),
            };
            Ok(DashboardCollectionItem {
                id: row.id,
                name: row.name,
                root_directory: row.root_directory,
                last_updated: row.last_updated,
                do_import: row.do_import,
                state,
                state_name: state.name(),
                colour: state.colour(),
                num_releases: row.num_releases,
            })
        })
        .collect()
}
