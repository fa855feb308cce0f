//! Scout Hub Backend
//!
//! A REST backend for a scouting organization's music and content library,
//! with SQLite persistence and local media file storage.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod storage;
mod validate;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenMap;
use config::Config;
use db::Repository;
use storage::{FileStore, LocalFileStore};

/// Largest accepted request body; covers media uploads.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub store: Arc<dyn FileStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scout Hub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Media root: {:?}", config.media_root);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if no write tokens are configured
    if config.api_tokens.is_empty() {
        tracing::warn!(
            "No API tokens configured (SCOUT_API_TOKENS). All write operations will be rejected!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize media storage
    tokio::fs::create_dir_all(&config.media_root).await?;
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(config.media_root.clone()));

    // Provision one identity per configured token
    let mut token_entries = Vec::new();
    for entry in &config.api_tokens {
        let identity = repo.ensure_identity(&entry.username).await?;
        token_entries.push((entry.token.clone(), identity));
    }
    let tokens = Arc::new(TokenMap::new(token_entries));

    // Create application state
    let state = AppState { repo, store };

    // Build router
    let app = create_router(state, tokens);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState, tokens: Arc<TokenMap>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Music
        .route("/music", get(api::list_music))
        .route("/music", post(api::create_music))
        .route("/music/{id}", get(api::get_music))
        .route("/music/{id}", put(api::update_music))
        .route("/music/{id}", patch(api::partial_update_music))
        .route("/music/{id}", delete(api::delete_music))
        // Scout content
        .route("/scout-content", get(api::list_scout_content))
        .route("/scout-content", post(api::create_scout_content))
        .route("/scout-content/{id}", get(api::get_scout_content))
        .route("/scout-content/{id}", put(api::update_scout_content))
        .route(
            "/scout-content/{id}",
            patch(api::partial_update_scout_content),
        )
        .route("/scout-content/{id}", delete(api::delete_scout_content))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // Attach the caller identity (or anonymous context) to every request
        .layer(middleware::from_fn(move |req, next| {
            auth::identity_layer(tokens.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
