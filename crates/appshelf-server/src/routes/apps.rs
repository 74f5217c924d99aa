//! Home screen registry.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};

use appshelf_core::APPS;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/apps", get(list_apps))
}

/// GET /api/apps — tools shown on the home screen.
async fn list_apps() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "apps": APPS,
        "total": APPS.len(),
    }))
}
