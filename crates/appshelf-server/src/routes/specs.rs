//! Markdown spec viewer.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use appshelf_core::apps::find_spec;
use appshelf_core::SPECS;

use crate::error::{ApiError, ApiResult};
use crate::markdown::{load_source, render_markdown};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/specs", get(list_specs))
        .route("/specs/{key}", get(get_spec))
}

/// GET /api/specs — registered documents and whether each has a file.
async fn list_specs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let dir = &state.config.data_paths.specs;
    let specs: Vec<_> = SPECS
        .iter()
        .map(|s| {
            serde_json::json!({
                "key": s.key,
                "label": s.label,
                "icon": s.icon,
                "available": dir.join(format!("{}.md", s.key)).is_file(),
            })
        })
        .collect();
    Json(serde_json::json!({ "specs": specs }))
}

/// GET /api/specs/{key} — one document rendered to HTML.
async fn get_spec(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let entry = find_spec(&key).ok_or_else(|| ApiError::not_found(format!("spec {}", key)))?;
    let (source, found) = load_source(&state.config.data_paths.specs, entry)?;
    let typography = state.settings.read().typography;

    Ok(Json(serde_json::json!({
        "key": entry.key,
        "label": entry.label,
        "icon": entry.icon,
        "found": found,
        "html": render_markdown(&source),
        "style": typography.css_declarations(),
    })))
}
