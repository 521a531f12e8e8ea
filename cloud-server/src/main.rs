//! FileGuard Server
//!
//! HTTP front for the FileGuard ingestion engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FILEGUARD SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │  API      │  │  Ingestion      │  │  Live Events     │  │
//! │  │  (Axum)   │─▶│  Engine (core)  │─▶│  (SSE broadcast) │  │
//! │  └─────┬─────┘  └────────┬────────┘  └──────────────────┘  │
//! │        └─────────────────┤                                  │
//! │                          ▼                                  │
//! │             ┌─────────────────────────┐                     │
//! │             │ PostgreSQL │ in-memory  │                     │
//! │             └─────────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod error;
mod sink;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use fileguard_core::logic::clock::{Clock, SystemClock};
use fileguard_core::{
    Aggregator, AnomalyScorer, Catalog, ContentStore, IngestionEngine, MemoryCatalog,
    MemoryContentStore,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use config::{Config, StorageBackend};
use sink::BroadcastSink;
use store::{PgCatalog, PgContentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize logging; `log` records from the core are bridged in
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fileguard_server=debug,fileguard_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("FileGuard Server starting...");
    tracing::info!("Environment: {}, timezone {}", config.environment, config.timezone);

    let (catalog, content): (Arc<dyn Catalog>, Arc<dyn ContentStore>) = match config.storage_backend {
        StorageBackend::Postgres => {
            tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            (
                Arc::new(PgCatalog::new(pool.clone())),
                Arc::new(PgContentStore::new(pool)),
            )
        }
        StorageBackend::Memory => {
            if config.is_production() {
                tracing::warn!("In-memory storage in production: everything is lost on restart");
            } else {
                tracing::info!("Using in-memory storage");
            }
            (Arc::new(MemoryCatalog::new()), Arc::new(MemoryContentStore::new()))
        }
    };

    let state = AppState::new(catalog, content, Arc::new(SystemClock), config.clone());

    // Train up front so the first upload does not pay for it
    match state.engine.warm_up().await {
        Ok(info) => tracing::info!(
            source = ?info.source,
            samples = info.samples,
            "Anomaly model ready"
        ),
        Err(e) => tracing::warn!("Model warm-up failed, retrying on first upload: {}", e),
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<IngestionEngine>,
    pub catalog: Arc<dyn Catalog>,
    pub content: Arc<dyn ContentStore>,
    pub aggregator: Arc<Aggregator>,
    pub events: BroadcastSink,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        content: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let events = BroadcastSink::default();
        let ingest_config = config.ingest_config();

        let engine = IngestionEngine::new(
            catalog.clone(),
            content.clone(),
            Arc::new(AnomalyScorer::default()),
            ingest_config.clone(),
        )
        .with_sink(Arc::new(events.clone()));

        Self {
            engine: Arc::new(engine),
            aggregator: Arc::new(Aggregator::new(catalog.clone(), ingest_config)),
            catalog,
            content,
            events,
            clock,
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Uploads
        .route("/api/upload", post(handlers::upload::upload))

        // Files
        .route("/api/files", get(handlers::files::list))
        .route("/api/files/:id", get(handlers::files::get))
        .route("/api/files/:id/download", get(handlers::files::download))
        .route("/api/files/:id/preview", get(handlers::files::preview))

        // Dashboard & live events
        .route("/api/dashboard", get(handlers::dashboard::get))
        .route("/api/events", get(handlers::events::stream))

        // Model
        .route("/api/model/retrain", post(handlers::model::retrain));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
