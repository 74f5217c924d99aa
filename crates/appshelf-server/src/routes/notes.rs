//! The notes pad.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use appshelf_store::NotePad;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/notes", get(get_notes).put(save_notes))
}

/// GET /api/notes — empty pad when nothing has been saved.
async fn get_notes(State(state): State<Arc<AppState>>) -> ApiResult<Json<NotePad>> {
    Ok(Json(state.store.load_note_pad()?))
}

#[derive(Debug, Deserialize)]
struct NotesBody {
    body: String,
}

/// PUT /api/notes — replace the pad contents.
async fn save_notes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NotesBody>,
) -> ApiResult<Json<NotePad>> {
    Ok(Json(state.store.save_note_pad(&body.body)?))
}
