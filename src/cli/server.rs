//! Cache HTTP server
//!
//! Serves the settings document and cached items from a [`CacheStore`]:
//!
//! - `GET /cache/settings` - `[{"id": "1", "settings": {...}}]` (or `[]`)
//! - `PUT /cache/settings/:id` - replace the offsets map
//! - `GET /cache/data/:collection?offset&limit` - cached items in id order
//! - `PUT /cache/data/:collection` - upsert an item by its `id`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::{CacheStore, DuckDbCacheStore};
use crate::error::{Error, Result};
use crate::state::{OffsetState, SettingsDocument};
use crate::types::cache_key;

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// DuckDB database file; in-memory when `None`
    pub db_path: Option<PathBuf>,
}

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    store: Arc<dyn CacheStore>,
}

/// Paging for `GET /cache/data/:collection`
#[derive(Debug, Deserialize)]
struct DataQuery {
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let store: Arc<dyn CacheStore> = match &config.db_path {
        Some(path) => Arc::new(DuckDbCacheStore::open(path)?),
        None => Arc::new(DuckDbCacheStore::in_memory()?),
    };

    let app = router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting cache server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Build the cache router over `store`
pub fn router(store: Arc<dyn CacheStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/cache/settings", get(get_settings))
        .route("/cache/settings/:id", put(put_settings))
        .route("/cache/data/:collection", get(get_data).put(put_data))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_settings(State(state): State<AppState>) -> Response {
    match state.store.load_settings().await {
        Ok(Some(document)) => (StatusCode::OK, Json(json!([document]))).into_response(),
        Ok(None) => (StatusCode::OK, Json(json!([]))).into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn put_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let document = SettingsDocument::new(id, OffsetState::from_settings_response(&body));

    match state.store.save_settings(&document).await {
        Ok(()) => (StatusCode::OK, Json(json!(document))).into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn get_data(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<DataQuery>,
) -> Response {
    let offset = query.offset.unwrap_or(0);

    match state.store.load_rows(&collection, offset, query.limit).await {
        Ok(rows) => (StatusCode::OK, Json(Value::Array(rows))).into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn put_data(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(item): Json<Value>,
) -> Response {
    let Some(id) = cache_key(&item) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Item must have a scalar id" })),
        )
            .into_response();
    };

    match state.store.upsert_row(&collection, &id, &item).await {
        Ok(()) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => internal_error(&e),
    }
}

fn internal_error(error: &Error) -> Response {
    tracing::error!("Cache request failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}
