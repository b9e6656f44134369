//! Docserver integration tests against a real PostgreSQL
//!
//! ```bash
//! cargo test -p dunya-server --test docserver_tests -- --ignored --nocapture
//! ```

mod common;

use common::{init_test_tracing, test_processor, write_mp3, TestPostgres, RECORDING_MBID};
use tempfile::TempDir;

use dunya_common::types::PermissionTier;
use dunya_server::db::users;
use dunya_server::docserver::access::Viewer;
use dunya_server::docserver::resolver::FileRequest;
use dunya_server::docserver::DocserverError;
use dunya_server::features::collections::commands::{
    create::{self as create_collection, CreateCollectionCommand},
    set_permission::{self, SetCollectionPermissionCommand},
};
use dunya_server::features::documents::commands::{
    add_source_file::{self, AddSourceFileCommand},
    create::{self as create_document, CreateDocumentCommand},
};
use dunya_server::features::documents::queries::get::{self as get_document, GetDocumentQuery};
use dunya_server::features::files::helpers;
use dunya_server::features::files::queries::{
    download::{self, DownloadFileQuery},
    resolve::{self, ResolveFileError, ResolveFileQuery},
};
use dunya_server::docserver::layout;
use dunya_server::features::modules::commands::create::{self as create_module, CreateModuleCommand};
use dunya_server::features::modules::commands::delete::{
    self as delete_module, DeleteModuleCommand, DeleteVersionCommand,
};
use dunya_server::features::workers::commands::{
    register::{self as register_worker, EssentiaBuild, PycompmusicBuild, RegisterWorkerCommand},
    set_updating::{self, SetWorkerUpdatingCommand, SetWorkerUpdatingError},
};
use dunya_server::features::workers::WorkerState;
use dunya_server::processing::orchestrator::{local_hostname, OutputTarget};
use dunya_server::processing::{ModuleOutputs, ModuleRegistry, OutputData, Provenance};

/// A collection rooted in a temp dir with one document and its mp3
struct Corpus {
    root: TempDir,
    collection_id: uuid::Uuid,
    document_id: uuid::Uuid,
    source_file_id: uuid::Uuid,
}

async fn corpus(pool: &sqlx::PgPool) -> Corpus {
    let root = TempDir::new().unwrap();
    write_mp3(&root.path().join("audio").join("kutcheri").join("track1.mp3"), None).unwrap();

    let collection = create_collection::handle(
        pool.clone(),
        CreateCollectionCommand {
            name: "Carnatic".to_string(),
            description: String::new(),
            root_directory: root.path().display().to_string(),
            collection_id: None,
        },
    )
    .await
    .unwrap();

    let document = create_document::handle(
        pool.clone(),
        CreateDocumentCommand {
            collection_id: collection.id,
            title: "Sri Raghuvara".to_string(),
            external_identifier: Some(RECORDING_MBID.to_string()),
        },
    )
    .await
    .unwrap();

    let source = add_source_file::handle(
        pool.clone(),
        AddSourceFileCommand {
            external_id: RECORDING_MBID.to_string(),
            file_type: "mp3".to_string(),
            path: root
                .path()
                .join("audio/kutcheri/track1.mp3")
                .display()
                .to_string(),
        },
    )
    .await
    .unwrap();
    assert!(source.created);
    assert_eq!(source.path, "kutcheri/track1.mp3");
    assert_eq!(source.size, 256);

    Corpus {
        root,
        collection_id: collection.id,
        document_id: document.id,
        source_file_id: source.id,
    }
}

async fn filehash_module(pool: &sqlx::PgPool) -> create_module::CreateModuleResponse {
    create_module::handle(
        pool.clone(),
        &ModuleRegistry::builtin(),
        CreateModuleCommand {
            module: "dunya.filehash.FileHash".to_string(),
            collections: vec!["carnatic".to_string()],
        },
    )
    .await
    .unwrap()
}

/// Relative paths of every part written for a module version
async fn part_paths(pool: &sqlx::PgPool, version_id: uuid::Uuid) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT p.path FROM derived_file_parts p
         JOIN derived_files df ON df.id = p.derived_file_id
         WHERE df.module_version_id = $1
         ORDER BY p.path",
    )
    .bind(version_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

fn query(slug: &str) -> ResolveFileQuery {
    ResolveFileQuery {
        external_id: RECORDING_MBID.to_string(),
        request: FileRequest::new(slug),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_source_file_resolves_to_collection_path() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();

    let resolved = resolve::handle(pg.pool_clone(), audio.path(), query("mp3"))
        .await
        .unwrap();
    assert_eq!(
        resolved.file.full_path,
        corpus.root.path().join("audio/kutcheri/track1.mp3")
    );
    assert_eq!(resolved.file.mimetype, "audio/mpeg");
    assert_eq!(resolved.url, format!("/docserver/by-id/{}/mp3", RECORDING_MBID));

    let err = resolve::handle(pg.pool_clone(), audio.path(), query("wav"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveFileError::Docserver(DocserverError::NotFound(_))
    ));

    let err = resolve::handle(pg.pool_clone(), audio.path(), query("spectrogram"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveFileError::Docserver(DocserverError::NotFound(_))
    ));
    assert_ne!(corpus.document_id, corpus.collection_id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_source_download_follows_collection_permissions() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let _corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();

    let anonymous = DownloadFileQuery {
        file: query("mp3"),
        viewer: Viewer::anonymous(),
    };
    let err = download::handle(pg.pool_clone(), audio.path(), anonymous.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveFileError::Docserver(DocserverError::PermissionDenied(_))
    ));

    set_permission::handle(
        pg.pool_clone(),
        SetCollectionPermissionCommand {
            collection: "carnatic".to_string(),
            source_type: "mp3".to_string(),
            permission: PermissionTier::Unrestricted,
            streamable: true,
        },
    )
    .await
    .unwrap();

    let plan = download::handle(pg.pool_clone(), audio.path(), anonymous)
        .await
        .unwrap();
    assert!(plan.rate_limited);

    let staff = DownloadFileQuery {
        file: query("mp3"),
        viewer: Viewer {
            user_id: None,
            is_staff: true,
            can_access_restricted: true,
        },
    };
    let plan = download::handle(pg.pool_clone(), audio.path(), staff).await.unwrap();
    assert!(!plan.rate_limited);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_processed_output_is_resolvable() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();

    let module = create_module::handle(
        pg.pool_clone(),
        &ModuleRegistry::builtin(),
        CreateModuleCommand {
            module: "dunya.filehash.FileHash".to_string(),
            collections: vec!["carnatic".to_string()],
        },
    )
    .await
    .unwrap();
    assert_eq!(module.slug, "filehash");
    assert_eq!(module.version, "0.1");

    let processor = test_processor(pg.pool_clone(), audio.path());
    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    // Two outputs, so the subtype must be given
    let err = resolve::handle(pg.pool_clone(), audio.path(), query("filehash"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveFileError::Docserver(DocserverError::TooMany(_))
    ));

    let mut sha = query("filehash");
    sha.request.subtype = Some("sha256".to_string());
    let resolved = resolve::handle(pg.pool_clone(), audio.path(), sha).await.unwrap();
    assert!(resolved.file.full_path.starts_with(audio.path()));
    assert!(resolved.file.full_path.exists());
    assert_eq!(resolved.file.mimetype, "application/json");
    assert_eq!(
        resolved.url,
        format!("/docserver/by-id/{}/filehash?part=1&v=0.1&subtype=sha256", RECORDING_MBID)
    );

    let detail = get_document::handle(
        pg.pool_clone(),
        GetDocumentQuery {
            external_id: RECORDING_MBID.to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(detail.collections, vec!["carnatic".to_string()]);
    assert_eq!(detail.sourcefiles, vec!["mp3".to_string()]);
    let outputs = &detail.derivedfiles["filehash"];
    assert_eq!(outputs["sha256"].numparts, 1);
    assert_eq!(outputs["sha256"].versions, vec!["0.1".to_string()]);
    assert!(outputs.contains_key("blocks"));

    let hash = helpers::json(
        pg.pool(),
        audio.path(),
        RECORDING_MBID,
        FileRequest::new("filehash").subtype("sha256"),
    )
    .await
    .unwrap();
    assert_eq!(hash["size"], 256);

    let blocks = FileRequest::new("filehash").subtype("blocks").part("1");
    let url = helpers::url(pg.pool(), audio.path(), RECORDING_MBID, blocks.clone())
        .await
        .unwrap();
    assert_eq!(
        url,
        format!("/docserver/by-id/{}/filehash?part=1&v=0.1&subtype=blocks", RECORDING_MBID)
    );
    let path = helpers::filename(pg.pool(), audio.path(), RECORDING_MBID, blocks)
        .await
        .unwrap();
    assert!(path.ends_with("filehash-blocks-1.json"));

    let err = helpers::contents(
        pg.pool(),
        audio.path(),
        RECORDING_MBID,
        FileRequest::new("filehash").subtype("blocks").part("first"),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ResolveFileError::Docserver(DocserverError::NotFound(_))
    ));

    // Running the same version again replaces its output
    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM derived_files WHERE document_id = $1")
        .bind(corpus.document_id)
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_api_token_identifies_viewer() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");

    let user_id = users::create_user_with_token(pg.pool(), "researcher", false, true, "s3cret")
        .await
        .unwrap();

    let viewer = users::viewer_for_token(pg.pool(), "s3cret")
        .await
        .unwrap()
        .expect("token should resolve to a user");
    assert_eq!(viewer.user_id, Some(user_id));
    assert!(!viewer.is_staff);
    assert!(viewer.can_access_restricted);

    assert!(users::viewer_for_token(pg.pool(), "guess").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_rerun_removes_parts_the_new_output_no_longer_has() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();
    let module = filehash_module(pg.pool()).await;
    let processor = test_processor(pg.pool_clone(), audio.path());

    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);

    // Pretend an earlier run produced a second block
    let blocks_id: uuid::Uuid = sqlx::query_scalar(
        "SELECT id FROM derived_files WHERE document_id = $1 AND outputname = 'blocks'",
    )
    .bind(corpus.document_id)
    .fetch_one(pg.pool())
    .await
    .unwrap();
    let mbid = RECORDING_MBID.parse().unwrap();
    let extra = layout::derived_part_path(
        corpus.collection_id,
        &mbid,
        "filehash",
        "0.1",
        "blocks",
        2,
        "json",
    );
    std::fs::write(audio.path().join(&extra), b"[]").unwrap();
    sqlx::query(
        "INSERT INTO derived_file_parts (derived_file_id, part_order, path, size)
         VALUES ($1, 2, $2, 2)",
    )
    .bind(blocks_id)
    .bind(extra.to_string_lossy().into_owned())
    .execute(pg.pool())
    .await
    .unwrap();

    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);

    assert!(!audio.path().join(&extra).exists());
    let paths = part_paths(pg.pool(), module.version_id).await;
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert!(audio.path().join(path).exists());
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_write_leaves_no_parts_behind() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();
    let module = filehash_module(pg.pool()).await;
    let processor = test_processor(pg.pool_clone(), audio.path());

    let target = OutputTarget {
        document_id: corpus.document_id,
        mbid: RECORDING_MBID.parse().unwrap(),
        collection_id: corpus.collection_id,
        module_slug: module.slug.clone(),
        version_id: module.version_id,
        version: module.version.clone(),
        source_file_id: corpus.source_file_id,
    };
    let part = |n| {
        audio.path().join(layout::derived_part_path(
            target.collection_id,
            &target.mbid,
            "filehash",
            "0.1",
            "blocks",
            n,
            "json",
        ))
    };
    // A directory where the second part should go makes that write fail
    std::fs::create_dir_all(part(2)).unwrap();

    let declared = ModuleRegistry::builtin()
        .get("dunya.filehash.FileHash")
        .unwrap()
        .outputs();
    let mut outputs = ModuleOutputs::new();
    outputs.insert(
        "blocks".to_string(),
        vec![
            OutputData::Json(serde_json::json!(["a"])),
            OutputData::Json(serde_json::json!(["b"])),
        ],
    );

    let result = processor
        .record_output(&target, &declared, &outputs, Provenance::default(), 0)
        .await;
    assert!(result.is_err());
    assert!(!part(1).exists());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM derived_files WHERE document_id = $1")
        .bind(corpus.document_id)
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_deleting_last_version_removes_parts_and_module() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();
    let module = filehash_module(pg.pool()).await;
    let processor = test_processor(pg.pool_clone(), audio.path());

    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);

    let paths = part_paths(pg.pool(), module.version_id).await;
    assert_eq!(paths.len(), 2);
    // A part already gone from disk is skipped
    std::fs::remove_file(audio.path().join(&paths[0])).unwrap();

    let deleted = delete_module::handle_version(
        &processor,
        DeleteVersionCommand {
            version_id: module.version_id,
        },
    )
    .await
    .unwrap();
    assert_eq!(deleted.parts_removed, 1);
    assert!(deleted.module_deleted);
    for path in &paths {
        assert!(!audio.path().join(path).exists());
    }

    let modules: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules WHERE id = $1")
        .bind(module.id)
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(modules, 0);
    let derived: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM derived_files")
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(derived, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_deleting_module_removes_all_output() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();
    let module = filehash_module(pg.pool()).await;
    let processor = test_processor(pg.pool_clone(), audio.path());

    processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    let paths = part_paths(pg.pool(), module.version_id).await;

    let deleted = delete_module::handle_module(
        &processor,
        DeleteModuleCommand {
            module_id: module.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(deleted.parts_removed, paths.len());
    assert!(deleted.module_deleted);
    for path in &paths {
        assert!(!audio.path().join(path).exists());
    }

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM module_versions WHERE module_id = $1")
        .bind(module.id)
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(versions, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_registered_worker_versions_are_recorded_on_output() {
    init_test_tracing();
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let corpus = corpus(pg.pool()).await;
    let audio = TempDir::new().unwrap();
    let module = filehash_module(pg.pool()).await;

    let committed = chrono::DateTime::parse_from_rfc3339("2024-02-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let worker = register_worker::handle(
        pg.pool_clone(),
        RegisterWorkerCommand {
            hostname: local_hostname(),
            essentia: EssentiaBuild {
                version: "2.1-beta5".to_string(),
                sha1: "a".repeat(40),
                commit_date: committed,
            },
            pycompmusic: PycompmusicBuild {
                sha1: "b".repeat(40),
                commit_date: committed,
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(worker.state, WorkerState::Updated);
    let essentia_id = worker.essentia_id.expect("essentia version registered");
    let pycompmusic_id = worker.pycompmusic_id.expect("pycompmusic version registered");

    let processor = test_processor(pg.pool_clone(), audio.path());
    let summary = processor
        .run_documents(module.version_id, vec![corpus.document_id])
        .await;
    assert_eq!(summary.succeeded, 1);

    let recorded: Vec<(Option<uuid::Uuid>, Option<uuid::Uuid>)> = sqlx::query_as(
        "SELECT essentia_id, pycompmusic_id FROM derived_files WHERE document_id = $1",
    )
    .bind(corpus.document_id)
    .fetch_all(pg.pool())
    .await
    .unwrap();
    assert_eq!(recorded.len(), 2);
    for row in recorded {
        assert_eq!(row, (Some(essentia_id), Some(pycompmusic_id)));
    }

    let updating = set_updating::handle(
        pg.pool_clone(),
        SetWorkerUpdatingCommand {
            hostname: local_hostname(),
        },
    )
    .await
    .unwrap();
    assert_eq!(updating.state, WorkerState::Updating);
    assert_eq!(updating.id, worker.id);

    let err = set_updating::handle(
        pg.pool_clone(),
        SetWorkerUpdatingCommand {
            hostname: "no-such-host".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SetWorkerUpdatingError::NotFound(_)));
}
