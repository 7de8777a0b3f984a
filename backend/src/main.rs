//! Coffee Tracker - Backend Server
//!
//! Keeps a personal coffee bean inventory and brewing log, and serves the
//! freshness, consumption and statistics views derived from them.

use axum::{routing::get, Router};
use chrono::FixedOffset;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod routes;
mod services;
mod storage;

pub use config::Config;

use config::StorageBackend;
use error::AppResult;
use services::{BloggerService, Records};
use storage::{ChangeFeed, RecordStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub records: Records,
    pub blogger: BloggerService,
    pub feed: ChangeFeed,
    pub config: Arc<Config>,
    /// Offset that decides which calendar day "today" is
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(
        records: Records,
        blogger: BloggerService,
        feed: ChangeFeed,
        config: Config,
    ) -> AppResult<Self> {
        let utc_offset = services::utc_offset(config.statistics.utc_offset_minutes)?;
        Ok(Self {
            records,
            blogger,
            feed,
            config: Arc::new(config),
            utc_offset,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ct_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Coffee Tracker Server");
    tracing::info!("Environment: {}", config.environment);

    let feed = ChangeFeed::new(config.events.channel_capacity);
    let store = open_store(&config, feed.clone()).await?;
    tracing::info!("Record store ready ({})", store.backend_name());

    let records = Records::new(store, config.default_settings());
    let blogger = BloggerService::bundled()?;

    // Create application state
    let state = AppState::new(records, blogger, feed, config.clone())?;

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the configured record store, running migrations for PostgreSQL
async fn open_store(config: &Config, feed: ChangeFeed) -> anyhow::Result<RecordStore> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.storage.database.max_connections)
                .min_connections(config.storage.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.storage.database.url)
                .await?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations completed");

            Ok(RecordStore::postgres(pool, feed))
        }
        StorageBackend::Files => Ok(RecordStore::files(&config.storage.data_dir, feed).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Ok(RecordStore::memory(feed))
        }
    }
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Coffee Tracker API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
