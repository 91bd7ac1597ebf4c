use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::api::{self, AppState};
use super::db::{CrmDb, DbHandle};
use super::fixtures;
use super::reporting::ReportOptions;
use super::repository::SqlRepository;
use super::settings::{DbSettingsBackend, SettingsBackend, SettingsStore};
use super::ws;

/// Configuration for the CRM server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
    /// Use an in-memory database instead of `db_path`.
    pub offline: bool,
    /// Seed data imported at startup (`contacts.json`, `deals.json`, `tasks.json`).
    pub fixtures: Option<PathBuf>,
    pub reports: ReportOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3141,
            db_path: PathBuf::from(".dealflow/crm.db"),
            dev_mode: false,
            offline: false,
            fixtures: None,
            reports: ReportOptions::default(),
        }
    }
}

/// Build the full application router with API and WebSocket routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database, seed fixtures and load settings.
pub async fn build_state(config: &ServerConfig) -> Result<Arc<AppState>> {
    let db = if config.offline {
        CrmDb::new_in_memory().context("Failed to open in-memory database")?
    } else {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        CrmDb::new(&config.db_path).context("Failed to initialize CRM database")?
    };

    if let Some(dir) = &config.fixtures {
        fixtures::seed_from_dir(&db, dir).context("Failed to seed fixtures")?;
    }

    let db = DbHandle::new(db);
    let backend: Arc<dyn SettingsBackend> = Arc::new(DbSettingsBackend::new(db.clone()));
    let settings = Arc::new(
        SettingsStore::load(backend)
            .await
            .context("Failed to load CRM settings")?,
    );
    let repo = SqlRepository::new(db, settings);
    Ok(Arc::new(AppState::new(repo, config.reports.clone())))
}

/// Start the CRM server and block until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let state = build_state(&config).await?;
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, offline = config.offline, "dealflow server listening");
    println!("dealflow running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
