//! Common test utilities for Dunya server integration tests
//!
//! Starts a PostgreSQL container with the migrations applied, and builds
//! small on-disk fixtures (collection roots, tagged mp3 files).
//!
//! These helpers need Docker. Tests that use them are marked
//! `#[ignore = "requires Docker"]`; run them with
//! `cargo test -p dunya-server -- --ignored`.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use id3::frame::{ExtendedText, UniqueFileIdentifier};
use id3::{Content, Frame, Tag, TagLike, Version};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

use dunya_server::config::DocserverConfig;
use dunya_server::processing::{ModuleRegistry, Processor};

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with migrations applied
pub struct TestPostgres {
    // Dropping the container stops it
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }
}

/// Processor writing derived files below `audio_root`
pub fn test_processor(pool: PgPool, audio_root: &Path) -> Processor {
    let config = DocserverConfig {
        audio_root: audio_root.to_path_buf(),
        stream_rate_limit: 200_000,
        processing_enabled: true,
        processing_concurrency: 2,
    };
    Processor::new(pool, Arc::new(ModuleRegistry::builtin()), &config)
}

// ============================================================================
// Fixtures
// ============================================================================

pub const RELEASE_MBID: &str = "0dc9d1f4-d6f7-4c6d-8ab4-7ee3bc5c1f34";
pub const RECORDING_MBID: &str = "16e5f8b1-a5a8-4a2a-b0c4-6fbcf0d6c1d2";

/// An ID3 tag carrying MusicBrainz release and recording ids
pub fn musicbrainz_tag(release: &str, recording: Option<&str>) -> Tag {
    let mut tag = Tag::new();
    tag.set_album("Kutcheri at Madras");
    tag.add_frame(ExtendedText {
        description: "MusicBrainz Album Id".to_string(),
        value: release.to_string(),
    });
    if let Some(recording) = recording {
        tag.add_frame(Frame::with_content(
            "UFID",
            Content::UniqueFileIdentifier(UniqueFileIdentifier {
                owner_identifier: "http://musicbrainz.org".to_string(),
                identifier: recording.as_bytes().to_vec(),
            }),
        ));
    }
    tag
}

/// Write an mp3-named file with an optional tag followed by some audio bytes
pub fn write_mp3(path: &Path, tag: Option<&Tag>) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    if let Some(tag) = tag {
        tag.write_to(&mut file, Version::Id3v24)?;
    }
    file.write_all(&[0x55u8; 256])?;
    Ok(())
}

/// Initialize tracing for tests (safe to call more than once)
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,dunya_server=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
