//! Dashboard integration tests: scan, import and completeness results
//!
//! ```bash
//! cargo test -p dunya-server --test dashboard_tests -- --ignored --nocapture
//! ```

mod common;

use common::{
    init_test_tracing, musicbrainz_tag, write_mp3, TestPostgres, RECORDING_MBID, RELEASE_MBID,
};
use tempfile::TempDir;
use uuid::Uuid;

use dunya_server::dashboard::{CheckerRegistry, CollectionState, ItemState, StateError};
use dunya_server::db::dashboard::{self as store, Owner, StateStoreError};
use dunya_server::features::dashboard::commands::{
    create_collection::{self, CreateDashboardCollectionCommand},
    import::{self, StartImportCommand, StartImportError},
    scan::{self, ScanCollectionCommand},
    set_ignore::{self, SetReleaseIgnoreCommand},
};
use dunya_server::features::dashboard::queries::{
    get_collection::{self, GetDashboardCollectionQuery},
    get_release::{self, GetReleaseQuery},
};

const OTHER_RELEASE_MBID: &str = "5b11f4ce-a62d-471e-81fc-a69a8278c7da";

/// One release directory (one file without a recording id) and one
/// directory of untagged files
fn collection_root() -> TempDir {
    let root = TempDir::new().unwrap();
    let cd1 = root.path().join("artist").join("cd1");
    write_mp3(
        &cd1.join("01 track.mp3"),
        Some(&musicbrainz_tag(RELEASE_MBID, Some(RECORDING_MBID))),
    )
    .unwrap();
    write_mp3(&cd1.join("02 track.mp3"), Some(&musicbrainz_tag(RELEASE_MBID, None))).unwrap();
    write_mp3(&root.path().join("loose").join("bare.mp3"), None).unwrap();
    root
}

async fn add_collection(pool: &sqlx::PgPool, root: &TempDir) -> Uuid {
    let created = create_collection::handle(
        pool.clone(),
        CreateDashboardCollectionCommand {
            collection_id: Uuid::new_v4(),
            name: "Carnatic".to_string(),
            root_directory: root.path().display().to_string(),
            checkers: vec![
                "file.has_recording_id".to_string(),
                "release.all_files_matched".to_string(),
            ],
            do_import: true,
        },
    )
    .await
    .unwrap();
    created.id
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_scan_and_import_collection() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = collection_root();
    let collection_id = add_collection(pg.pool(), &root).await;

    let summary = scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(summary.directories, 2);
    assert_eq!(summary.files, 3);
    assert_eq!(summary.new_files, 3);
    assert_eq!(summary.matched_directories, 1);
    assert_eq!(summary.new_releases, 1);

    let registry = CheckerRegistry::builtin();
    let imported = import::handle(pg.pool_clone(), &registry, StartImportCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(imported.releases_imported, 1);
    assert_eq!(imported.releases_failed, 0);
    assert_eq!(imported.checks.releases_checked, 1);
    assert_eq!(imported.checks.files_checked, 2);
    // The untagged recording fails both the file and the release checker
    assert_eq!(imported.checks.bad_results, 2);
    assert!(imported.finished);

    let overview = get_collection::handle(
        pg.pool_clone(),
        GetDashboardCollectionQuery {
            collection_id,
            order: Some("error".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(overview.state.current.state, CollectionState::Finished);
    assert_eq!(overview.totals.total, 1);
    assert_eq!(overview.totals.finished, 1);
    assert_eq!(overview.unmatched_directories.len(), 1);
    assert_eq!(overview.unmatched_directories[0].path, "loose");
    assert_eq!(overview.releases[0].state, ItemState::Finished);
    assert_eq!(overview.releases[0].error_count, 2);
    assert_eq!(overview.releases[0].title, "Kutcheri at Madras");

    let release = get_release::handle(
        pg.pool_clone(),
        GetReleaseQuery {
            release_id: overview.releases[0].id,
        },
    )
    .await
    .unwrap();
    assert_eq!(release.latest_results.len(), 1);
    assert!(release.previous_results.is_empty());

    // A finished collection can be scanned again without duplicating rows
    let rescan = scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(rescan.files, 3);
    assert_eq!(rescan.new_files, 0);
    assert_eq!(rescan.new_releases, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_import_requires_scan() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = collection_root();
    let collection_id = add_collection(pg.pool(), &root).await;

    let err = import::handle(
        pg.pool_clone(),
        &CheckerRegistry::builtin(),
        StartImportCommand { collection_id },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        StartImportError::Store(StateStoreError::State(StateError::InvalidTransition { .. }))
    ));

    let overview = get_collection::handle(
        pg.pool_clone(),
        GetDashboardCollectionQuery {
            collection_id,
            order: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(overview.state.current.state, CollectionState::NotStarted);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ignored_release_is_not_imported() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = collection_root();
    let collection_id = add_collection(pg.pool(), &root).await;
    scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();

    let release_id: Uuid =
        sqlx::query_scalar("SELECT id FROM musicbrainz_releases WHERE collection_id = $1")
            .bind(collection_id)
            .fetch_one(pg.pool())
            .await
            .unwrap();
    let release = set_ignore::handle(
        pg.pool_clone(),
        SetReleaseIgnoreCommand {
            release_id,
            ignore: true,
        },
    )
    .await
    .unwrap();
    assert!(release.ignore);

    let imported = import::handle(
        pg.pool_clone(),
        &CheckerRegistry::builtin(),
        StartImportCommand { collection_id },
    )
    .await
    .unwrap();
    assert_eq!(imported.releases_imported, 0);
    assert_eq!(imported.checks.releases_checked, 0);
    assert!(imported.finished);

    let detail = get_release::handle(pg.pool_clone(), GetReleaseQuery { release_id })
        .await
        .unwrap();
    assert_eq!(detail.state.current.state, ItemState::NotStarted);
}

async fn collection_state(pool: &sqlx::PgPool, collection_id: Uuid) -> CollectionState {
    store::state_history::<CollectionState>(pool, Owner::Collection, collection_id)
        .await
        .unwrap()
        .current
        .state
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_release_puts_collection_in_error() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = collection_root();
    let collection_id = add_collection(pg.pool(), &root).await;
    scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();

    // A release already importing cannot start again
    let release_id: Uuid =
        sqlx::query_scalar("SELECT id FROM musicbrainz_releases WHERE collection_id = $1")
            .bind(collection_id)
            .fetch_one(pg.pool())
            .await
            .unwrap();
    store::transition(pg.pool(), Owner::Release, release_id, ItemState::Importing)
        .await
        .unwrap();

    let registry = CheckerRegistry::builtin();
    let imported = import::handle(pg.pool_clone(), &registry, StartImportCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(imported.releases_failed, 1);
    assert!(!imported.finished);
    assert_eq!(collection_state(pg.pool(), collection_id).await, CollectionState::Error);

    // Error allows a rescan, after which the release imports
    scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();
    let imported = import::handle(pg.pool_clone(), &registry, StartImportCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(imported.releases_imported, 1);
    assert!(imported.finished);
    assert_eq!(collection_state(pg.pool(), collection_id).await, CollectionState::Finished);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_release_orphaned_by_rescan_does_not_block_finish() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = TempDir::new().unwrap();
    let track = root.path().join("artist").join("cd1").join("01 track.mp3");
    write_mp3(&track, Some(&musicbrainz_tag(RELEASE_MBID, Some(RECORDING_MBID)))).unwrap();
    let collection_id = add_collection(pg.pool(), &root).await;
    scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();

    // The directory now belongs to another release
    write_mp3(&track, Some(&musicbrainz_tag(OTHER_RELEASE_MBID, Some(RECORDING_MBID)))).unwrap();
    let rescan = scan::handle(pg.pool_clone(), ScanCollectionCommand { collection_id })
        .await
        .unwrap();
    assert_eq!(rescan.new_releases, 1);

    let imported = import::handle(
        pg.pool_clone(),
        &CheckerRegistry::builtin(),
        StartImportCommand { collection_id },
    )
    .await
    .unwrap();
    assert_eq!(imported.releases_imported, 1);
    assert!(imported.finished);
    assert_eq!(collection_state(pg.pool(), collection_id).await, CollectionState::Finished);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_collection_checkers_keep_creation_order() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let root = collection_root();
    let created = create_collection::handle(
        pg.pool_clone(),
        CreateDashboardCollectionCommand {
            collection_id: Uuid::new_v4(),
            name: "Hindustani".to_string(),
            root_directory: root.path().display().to_string(),
            checkers: vec![
                "release.all_files_matched".to_string(),
                "file.nonempty".to_string(),
                "file.has_recording_id".to_string(),
            ],
            do_import: false,
        },
    )
    .await
    .unwrap();

    for _ in 0..3 {
        let modules: Vec<String> = store::collection_checkers(pg.pool(), created.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.module)
            .collect();
        assert_eq!(
            modules,
            vec!["file.has_recording_id", "file.nonempty", "release.all_files_matched"]
        );
    }
}
