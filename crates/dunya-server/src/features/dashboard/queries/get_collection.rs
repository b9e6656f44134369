//! Collection overview: state, checkers, releases and unmatched directories

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dashboard::checkers::error_count;
use crate::dashboard::scanner::short_path;
use crate::dashboard::summary::{sort_releases, totals, ReleaseTotals};
use crate::dashboard::{CheckerType, CollectionState, ItemState, ReleaseOrder, ReleaseSummary, StateHistory};
use crate::db::dashboard::{
    collection_checkers, collection_releases, directory_files, find_collection, log_messages,
    release_directories, release_files, results, state_history, unmatched_directories,
    LinkedChecker, LogMessageRow, Owner, ReleaseRow, StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetDashboardCollectionQuery {
    #[serde(skip)]
    pub collection_id: Uuid,

    /// `date`, `unmatched`, `ignored` or `error`
    #[serde(default)]
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedDirectory {
    pub id: Uuid,
    pub path: String,
    pub short_path: String,
    pub num_files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionOverview {
    pub id: Uuid,
    pub name: String,
    pub root_directory: String,
    pub last_updated: DateTime<Utc>,
    pub do_import: bool,
    pub state: StateHistory<CollectionState>,
    pub colour: Option<&'static str>,
    pub checkers: Vec<LinkedChecker>,
    pub totals: ReleaseTotals,
    pub order: ReleaseOrder,
    pub releases: Vec<ReleaseSummary>,
    pub unmatched_directories: Vec<UnmatchedDirectory>,
    pub log: Vec<LogMessageRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDashboardCollectionError {
    #[error("Dashboard collection {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    InvalidOrder(String),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<CollectionOverview, GetDashboardCollectionError>>
    for GetDashboardCollectionQuery
{
}

impl crate::cqrs::middleware::Query for GetDashboardCollectionQuery {}

impl GetDashboardCollectionQuery {
    pub fn release_order(&self) -> Result<ReleaseOrder, GetDashboardCollectionError> {
        self.order
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(GetDashboardCollectionError::InvalidOrder)
    }
}

#[tracing::instrument(skip(pool), fields(collection_id = %query.collection_id))]
pub async fn handle(
    pool: PgPool,
    query: GetDashboardCollectionQuery,
) -> Result<CollectionOverview, GetDashboardCollectionError> {
    let order = query.release_order()?;
    let collection = find_collection(&pool, query.collection_id)
        .await?
        .ok_or(GetDashboardCollectionError::NotFound(query.collection_id))?;

    let state = state_history::<CollectionState>(&pool, Owner::Collection, collection.id).await?;
    let checkers = collection_checkers(&pool, collection.id).await?;

    let mut releases = Vec::new();
    for release in collection_releases(&pool, collection.id).await? {
        releases.push(release_summary(&pool, &release, &checkers).await?);
    }
    sort_releases(&mut releases, order);

    let mut unmatched = Vec::new();
    for directory in unmatched_directories(&pool, collection.id).await? {
        let num_files = directory_files(&pool, directory.id).await?.len();
        unmatched.push(UnmatchedDirectory {
            id: directory.id,
            short_path: short_path(&directory.path),
            path: directory.path,
            num_files,
        });
    }

    Ok(CollectionOverview {
        id: collection.id,
        name: collection.name,
        root_directory: collection.root_directory,
        last_updated: collection.last_updated,
        do_import: collection.do_import,
        colour: state.current.state.colour(),
        state,
        checkers,
        totals: totals(&releases),
        order,
        releases,
        unmatched_directories: unmatched,
        log: log_messages(&pool, Owner::Collection, collection.id).await?,
    })
}

/// Checker ids of one type, in display order
pub(crate) fn checker_order(checkers: &[LinkedChecker], kind: CheckerType) -> Vec<Uuid> {
    checkers
        .iter()
        .filter(|c| c.kind() == Some(kind))
        .map(|c| c.id)
        .collect()
}

async fn release_summary(
    pool: &PgPool,
    release: &ReleaseRow,
    checkers: &[LinkedChecker],
) -> Result<ReleaseSummary, GetDashboardCollectionError> {
    let state = state_history::<ItemState>(pool, Owner::Release, release.id).await?;
    let directories = release_directories(pool, release.id).await?;
    let files = release_files(pool, release.id).await?;

    let release_checkers = checker_order(checkers, CheckerType::Release);
    let file_checkers = checker_order(checkers, CheckerType::File);

    let mut errors = error_count(results(pool, Owner::Release, release.id).await?, &release_checkers);
    for file in &files {
        errors += error_count(results(pool, Owner::File, file.id).await?, &file_checkers);
    }

    Ok(ReleaseSummary {
        id: release.id,
        mbid: release.mbid,
        title: release.title.clone(),
        artist: release.artist.clone().unwrap_or_default(),
        ignore: release.ignore,
        state: state.current.state,
        state_date: state.current.state_date,
        matched_paths: directories.into_iter().map(|d| d.path).collect(),
        file_count: files.len(),
        error_count: errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(kind: &str) -> LinkedChecker {
        LinkedChecker {
            id: Uuid::new_v4(),
            name: "checker".to_string(),
            module: "file.nonempty".to_string(),
            checker_type: kind.to_string(),
        }
    }

    #[test]
    fn test_release_order_parsing() {
        let query = GetDashboardCollectionQuery {
            collection_id: Uuid::nil(),
            order: None,
        };
        assert_eq!(query.release_order().unwrap(), ReleaseOrder::None);

        let query = GetDashboardCollectionQuery {
            collection_id: Uuid::nil(),
            order: Some("bogus".to_string()),
        };
        assert!(matches!(
            query.release_order(),
            Err(GetDashboardCollectionError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_checker_order_filters_by_type() {
        let checkers = vec![checker("f"), checker("r"), checker("f")];
        let files = checker_order(&checkers, CheckerType::File);
        assert_eq!(files, vec![checkers[0].id, checkers[2].id]);
        assert_eq!(checker_order(&checkers, CheckerType::Release), vec![checkers[1].id]);
    }
}
