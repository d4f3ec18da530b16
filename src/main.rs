//! KnoHub Server: course and resource file hub.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use knohub_api::{AppState, build_app};
use knohub_core::config::AppConfig;
use knohub_core::traits::StorageBackend;
use knohub_database::migration::run_migrations;
use knohub_database::{DatabasePool, MemoryTreeStore, PgTreeStore, TreeStore};
use knohub_storage::LocalStorageBackend;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `KNOHUB_ENV` overlay, and env overrides.
fn load_configuration() -> anyhow::Result<AppConfig> {
    let env = std::env::var("KNOHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env).with_context(|| format!("loading configuration for env '{env}'"))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        "compact" => {
            fmt().compact().with_env_filter(filter).init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TreeStore>> {
    if config.database.is_memory() {
        tracing::warn!("Using the in-memory tree store; data is lost on shutdown");
        return Ok(Arc::new(MemoryTreeStore::new()));
    }

    let db = DatabasePool::connect(&config.database)
        .await
        .context("connecting to the database")?;
    if config.database.run_migrations {
        run_migrations(db.pool())
            .await
            .context("running migrations")?;
    }
    Ok(Arc::new(PgTreeStore::new(db.into_pool())))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting KnoHub v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorageBackend::new(&config.storage.upload_dir)
            .await
            .context("initializing upload storage")?,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(config, store, storage));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("KnoHub server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving HTTP")?;

    tracing::info!("KnoHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
