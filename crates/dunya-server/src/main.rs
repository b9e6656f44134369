//! Dunya Server - Main entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dunya_common::logging::{init_logging, LogConfig};
use serde_json::json;
use sqlx::PgPool;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use dunya_server::{
    config::Config,
    dashboard::CheckerRegistry,
    db::{self, DbConfig},
    features, middleware,
    processing::{ModuleRegistry, Processor},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("dunya-server")
        .filter_directives("dunya_server=debug,tower_http=debug,axum=info,sqlx=info")
        .build();

    // Environment variables take precedence
    let log_config = LogConfig::from_env_with(log_config.clone()).unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Dunya Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&DbConfig::from(&config.database)).await?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let modules = Arc::new(ModuleRegistry::builtin());
    let processor = Processor::new(db_pool.clone(), modules, &config.docserver);
    if processor.is_enabled() {
        info!("Processing enabled, audio root {}", config.docserver.audio_root.display());
    } else {
        info!("Processing is disabled (DUNYA_PROCESSING_ENABLED=false)");
    }

    let state = features::FeatureState {
        db: db_pool,
        docserver: config.docserver.clone(),
        processor,
        checkers: Arc::new(CheckerRegistry::builtin()),
    };

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: features::FeatureState, config: &Config) -> Router {
    let db = state.db.clone();

    Router::new()
        .route("/health", get(health_check))
        .with_state(db)
        .merge(features::router(state))
        // Innermost first
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(pool): State<PgPool>) -> Result<Response, StatusCode> {
    match db::health_check(&pool).await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
