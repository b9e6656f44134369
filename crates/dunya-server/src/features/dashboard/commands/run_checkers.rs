//! Run a collection's completeness checkers
//!
//! File checkers run on each file of every importable release, release
//! checkers on the release itself. Each verdict is stored as a new result so
//! earlier ones stay visible as history.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dashboard::checkers::{CheckTarget, CompletenessChecker, ReleaseTarget};
use crate::dashboard::{CheckerRegistry, CheckerType};
use crate::db::dashboard::{
    add_log_message, collection_checkers, find_collection, importable_releases, insert_result,
    release_files, Owner, ReleaseRow, StateStoreError,
};
use crate::db::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCheckersCommand {
    pub collection_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub releases_checked: usize,
    pub files_checked: usize,
    pub bad_results: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RunCheckersError {
    #[error("Dashboard collection {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StateStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Request<Result<CheckSummary, RunCheckersError>> for RunCheckersCommand {}

impl crate::cqrs::middleware::Command for RunCheckersCommand {}

struct Active {
    id: Uuid,
    checker: std::sync::Arc<dyn CompletenessChecker>,
}

#[tracing::instrument(skip(pool, registry), fields(collection_id = %command.collection_id))]
pub async fn handle(
    pool: PgPool,
    registry: &CheckerRegistry,
    command: RunCheckersCommand,
) -> Result<CheckSummary, RunCheckersError> {
    let collection = find_collection(&pool, command.collection_id)
        .await?
        .ok_or(RunCheckersError::NotFound(command.collection_id))?;

    let mut file_checkers = Vec::new();
    let mut release_checkers = Vec::new();
    for linked in collection_checkers(&pool, collection.id).await? {
        let Some(checker) = registry.get(&linked.module) else {
            tracing::warn!(module = %linked.module, "Checker not available, skipping");
            add_log_message(
                &pool,
                Owner::Collection,
                collection.id,
                &format!("Checker {} is not available on this server", linked.module),
                None,
            )
            .await?;
            continue;
        };
        let active = Active {
            id: linked.id,
            checker,
        };
        match active.checker.checker_type() {
            CheckerType::File => file_checkers.push(active),
            CheckerType::Release => release_checkers.push(active),
        }
    }

    let mut summary = CheckSummary::default();
    for release in importable_releases(&pool, collection.id).await? {
        check_release(&pool, &release, &file_checkers, &release_checkers, &mut summary).await?;
    }

    tracing::info!(?summary, "Checkers finished");
    Ok(summary)
}

async fn check_release(
    pool: &PgPool,
    release: &ReleaseRow,
    file_checkers: &[Active],
    release_checkers: &[Active],
    summary: &mut CheckSummary,
) -> Result<(), RunCheckersError> {
    let target = ReleaseTarget {
        id: release.id,
        mbid: release.mbid,
        title: release.title.clone(),
        files: release_files(pool, release.id).await?,
    };

    for file in &target.files {
        for active in file_checkers {
            let verdict = active.checker.check(CheckTarget::File(file));
            if !verdict.good {
                summary.bad_results += 1;
            }
            insert_result(pool, Owner::File, file.id, active.id, verdict.code(), &verdict.data)
                .await?;
        }
        summary.files_checked += 1;
    }

    for active in release_checkers {
        let verdict = active.checker.check(CheckTarget::Release(&target));
        if !verdict.good {
            summary.bad_results += 1;
        }
        insert_result(pool, Owner::Release, release.id, active.id, verdict.code(), &verdict.data)
            .await?;
    }
    summary.releases_checked += 1;
    Ok(())
}
