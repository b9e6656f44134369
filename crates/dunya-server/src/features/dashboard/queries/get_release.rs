//! One release: state history, checker results, matched files and log

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::get_collection::checker_order;
use crate::dashboard::checkers::{latest_results, previous_results, ResultRow};
use crate::dashboard::scanner::short_path;
use crate::dashboard::{CheckerType, ItemState, StateHistory};
use crate::db::dashboard::{
    collection_checkers, directory_files, find_release, log_messages, release_directories,
    results, state_history, LogMessageRow, Owner, StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetReleaseQuery {
    pub release_id: Uuid,
}

/// Older results of one checker, newest first
#[derive(Debug, Clone, Serialize)]
pub struct CheckerHistory {
    pub checker_id: Uuid,
    pub results: Vec<ResultRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseFile {
    pub id: Uuid,
    pub name: String,
    pub recording_id: Option<Uuid>,
    pub filesize: Option<i64>,
    pub state: ItemState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseDirectory {
    pub id: Uuid,
    pub path: String,
    pub short_path: String,
    pub files: Vec<ReleaseFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseDetail {
    pub id: Uuid,
    pub mbid: Uuid,
    pub collection_id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    pub ignore: bool,
    pub state: StateHistory<ItemState>,
    pub latest_results: Vec<ResultRow>,
    pub previous_results: Vec<CheckerHistory>,
    pub directories: Vec<ReleaseDirectory>,
    pub log: Vec<LogMessageRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetReleaseError {
    #[error("Release {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<ReleaseDetail, GetReleaseError>> for GetReleaseQuery {}

impl crate::cqrs::middleware::Query for GetReleaseQuery {}

/// Split stored results into the newest per checker and the older history
pub(crate) fn split_results(
    rows: Vec<ResultRow>,
    checkers: &[Uuid],
) -> (Vec<ResultRow>, Vec<CheckerHistory>) {
    let latest = latest_results(rows.clone(), checkers);
    let previous = checkers
        .iter()
        .map(|checker_id| CheckerHistory {
            checker_id: *checker_id,
            results: previous_results(rows.clone(), *checker_id),
        })
        .filter(|h| !h.results.is_empty())
        .collect();
    (latest, previous)
}

#[tracing::instrument(skip(pool), fields(release_id = %query.release_id))]
pub async fn handle(pool: PgPool, query: GetReleaseQuery) -> Result<ReleaseDetail, GetReleaseError> {
    let release = find_release(&pool, query.release_id)
        .await?
        .ok_or(GetReleaseError::NotFound(query.release_id))?;

    let checkers = collection_checkers(&pool, release.collection_id).await?;
    let order = checker_order(&checkers, CheckerType::Release);
    let (latest, previous) =
        split_results(results(&pool, Owner::Release, release.id).await?, &order);

    let mut directories = Vec::new();
    for directory in release_directories(&pool, release.id).await? {
        let mut files = Vec::new();
        for file in directory_files(&pool, directory.id).await? {
            let history = state_history::<ItemState>(&pool, Owner::File, file.id).await?;
            files.push(ReleaseFile {
                id: file.id,
                name: file.name,
                recording_id: file.recording_id,
                filesize: file.filesize,
                state: history.current.state,
            });
        }
        directories.push(ReleaseDirectory {
            id: directory.id,
            short_path: short_path(&directory.path),
            path: directory.path,
            files,
        });
    }

    Ok(ReleaseDetail {
        id: release.id,
        mbid: release.mbid,
        collection_id: release.collection_id,
        title: release.title,
        artist: release.artist,
        ignore: release.ignore,
        state: state_history::<ItemState>(&pool, Owner::Release, release.id).await?,
        latest_results: latest,
        previous_results: previous,
        directories,
        log: log_messages(&pool, Owner::Release, release.id).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn result(id: i64, checker: Uuid, minute: u32) -> ResultRow {
        ResultRow {
            id,
            checker_id: checker,
            checker_name: "All files matched".to_string(),
            result: "g".to_string(),
            data: None,
            datetime: Utc.with_ymd_and_hms(2015, 2, 1, 9, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_split_results() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![result(1, a, 0), result(2, a, 5), result(3, b, 1)];

        let (latest, previous) = split_results(rows, &[a, b]);
        assert_eq!(latest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].checker_id, a);
        assert_eq!(previous[0].results[0].id, 1);
    }
}
