//! Health and storage statistics routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use appshelf_viewer::format_size;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(get_stats))
}

/// GET /api/health — liveness and storage reachability.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let storage = state.store.count_documents().is_ok();
    Json(serde_json::json!({
        "status": if storage { "ok" } else { "degraded" },
        "storage": storage,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/stats — storage statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.store.get_stats()?;
    let used = stats.payload_bytes.max(0) as u64;
    let quota = stats.quota_bytes;

    Ok(Json(serde_json::json!({
        "documents": stats.total_documents,
        "annotations": stats.total_annotations,
        "cachedSearches": stats.cached_searches,
        "payloadBytes": used,
        "quotaBytes": quota,
        "usedLabel": format_size(used),
        "quotaLabel": format_size(quota),
        "dbSizeMb": stats.db_size_mb,
        "dbPath": stats.db_path,
    })))
}
