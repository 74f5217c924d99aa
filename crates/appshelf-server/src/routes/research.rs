//! Literature search and add-to-library.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use appshelf_research::{Paper, SortKey};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/research/search", post(search))
        .route("/research/library", post(add_to_library))
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    query: String,
    #[serde(default)]
    sort: SortKey,
}

/// POST /api/research/search — merged results from both indexes.
///
/// The request token is cancelled if the client goes away or the server
/// shuts down.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = state.shutdown.child_token();
    let _guard = token.clone().drop_guard();

    let outcome = state.research.search(&body.query, &token).await?;
    let results = state.research.view(&outcome, body.sort)?;

    let sort_options: Vec<_> = SortKey::ALL
        .iter()
        .map(|k| serde_json::json!({ "key": k, "label": k.label() }))
        .collect();

    Ok(Json(serde_json::json!({
        "query": outcome.query,
        "results": results,
        "shown": results.len(),
        "total": outcome.papers.len(),
        "note": outcome.note,
        "cached": outcome.cached,
        "sort": body.sort,
        "sortOptions": sort_options,
    })))
}

#[derive(Debug, Deserialize)]
struct AddBody {
    paper: Paper,
}

/// POST /api/research/library — download the open-access PDF into the library.
async fn add_to_library(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddBody>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let token = state.shutdown.child_token();
    let _guard = token.clone().drop_guard();

    let doc = state.research.add_to_library(&body.paper, &token).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "document": doc }))))
}
