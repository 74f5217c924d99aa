//! Document library: PDF upload and listing, payload download, page counts,
//! and Q&A annotations.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use appshelf_core::Error;
use appshelf_store::{DeleteMode, Document};
use appshelf_viewer::layout::{annotation_offset, document_summary};
use appshelf_viewer::{format_size, ViewerLayout};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body cap for uploads; the store quota is enforced separately.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/documents",
            get(list_documents)
                .post(upload_documents)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/documents/{id}", get(get_document).delete(delete_document))
        .route("/documents/{id}/bytes", get(document_bytes))
        .route("/documents/{id}/pages", put(set_page_count))
        .route("/documents/{id}/layout", get(viewer_layout))
        .route(
            "/documents/{id}/annotations",
            get(list_annotations).post(create_annotation),
        )
        .route("/annotations/{id}", delete(delete_annotation))
}

fn document_json(doc: &Document) -> serde_json::Value {
    let size = doc.size_bytes.max(0) as u64;
    serde_json::json!({
        "id": doc.id,
        "name": doc.name,
        "sizeBytes": doc.size_bytes,
        "pageCount": doc.page_count,
        "addedAt": doc.added_at,
        "sizeLabel": format_size(size),
        "summary": document_summary(doc.page_count, size),
    })
}

fn require_document(state: &AppState, id: i64) -> ApiResult<Document> {
    state
        .store
        .get_document(id)?
        .ok_or_else(|| ApiError::not_found(format!("document {}", id)))
}

/// GET /api/documents — library, newest first.
async fn list_documents(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let docs = state.store.list_documents_newest_first()?;
    let documents: Vec<_> = docs.iter().map(document_json).collect();
    Ok(Json(serde_json::json!({
        "documents": documents,
        "total": documents.len(),
    })))
}

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

fn is_pdf_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf") && name.len() > 4
}

/// POST /api/documents — upload one or more PDFs (multipart).
async fn upload_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut uploaded = Vec::new();
    let mut errors = Vec::new();
    let mut first_error: Option<Error> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                first_error.get_or_insert(Error::InvalidInput(e.body_text()));
                break;
            }
        };
        let filename = match field.file_name() {
            Some(name) => sanitize_filename(name),
            None => continue,
        };

        if !is_pdf_name(&filename) {
            errors.push(serde_json::json!({
                "filename": filename,
                "error": "Only .pdf files can be added",
            }));
            first_error.get_or_insert(Error::InvalidInput(format!("{} is not a PDF", filename)));
            continue;
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(serde_json::json!({
                    "filename": filename,
                    "error": format!("Read failed: {}", e),
                }));
                first_error.get_or_insert(Error::InvalidInput(e.body_text()));
                continue;
            }
        };

        let saved = state
            .store
            .save_document(&filename, bytes.len() as i64, &bytes)
            .and_then(|id| {
                state
                    .store
                    .get_document(id)?
                    .ok_or_else(|| Error::RecordNotFound(format!("document {}", id)))
            });
        match saved {
            Ok(doc) => {
                info!("Uploaded {} ({})", doc.name, format_size(bytes.len() as u64));
                uploaded.push(document_json(&doc));
            }
            Err(e) => {
                errors.push(serde_json::json!({
                    "filename": filename,
                    "error": e.user_message(),
                    "kind": e.kind(),
                }));
                first_error.get_or_insert(e);
            }
        }
    }

    let status = match (uploaded.is_empty(), first_error) {
        (false, _) => StatusCode::CREATED,
        (true, Some(e)) => ApiError(e).status(),
        (true, None) => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(serde_json::json!({
            "uploaded": uploaded.len(),
            "errors": errors.len(),
            "documents": uploaded,
            "errorDetails": errors,
        })),
    )
}

/// GET /api/documents/{id} — metadata plus annotations.
async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let doc = require_document(&state, id)?;
    let annotations = state.store.list_annotations(id)?;
    Ok(Json(serde_json::json!({
        "document": document_json(&doc),
        "annotations": annotations,
    })))
}

/// GET /api/documents/{id}/bytes — the stored PDF.
async fn document_bytes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let doc = require_document(&state, id)?;
    let bytes = state.store.load_document_bytes(id)?;
    let disposition = format!("inline; filename=\"{}\"", doc.name.replace('"', "'"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageCountBody {
    page_count: i64,
}

/// PUT /api/documents/{id}/pages — record the page count after first render.
async fn set_page_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PageCountBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let doc = state.store.update_page_count(id, body.page_count)?;
    Ok(Json(document_json(&doc)))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    cascade: bool,
}

/// DELETE /api/documents/{id}?cascade=true|false
///
/// Annotations are kept unless `cascade=true`.
async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let mode = if query.cascade {
        DeleteMode::Cascade
    } else {
        DeleteMode::KeepAnnotations
    };
    if !state.store.delete_document(id, mode)? {
        return Err(ApiError::not_found(format!("document {}", id)));
    }
    info!("Deleted document {} ({:?})", id, mode);
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutQuery {
    viewer_width: f64,
    #[serde(default)]
    sidebar_open: bool,
    #[serde(default = "default_scale")]
    scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// GET /api/documents/{id}/layout — page render width for a viewer size.
async fn viewer_layout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LayoutQuery>,
) -> ApiResult<Json<ViewerLayout>> {
    require_document(&state, id)?;
    if !query.viewer_width.is_finite() || query.viewer_width < 0.0 {
        return Err(ApiError::bad_request("viewerWidth must be a non-negative number"));
    }
    let scale = appshelf_viewer::ScaleLimits::default().clamp(query.scale);
    Ok(Json(ViewerLayout::new(query.viewer_width, query.sidebar_open, scale)))
}

/// GET /api/documents/{id}/annotations
async fn list_annotations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let annotations = state.store.list_annotations(id)?;
    Ok(Json(serde_json::json!({
        "annotations": annotations,
        "total": annotations.len(),
    })))
}

/// Either an explicit offset or the raw sidebar tap to derive one from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewAnnotation {
    vertical_offset: Option<f64>,
    tap_y: Option<f64>,
    #[serde(default)]
    pane_top: f64,
    #[serde(default)]
    scroll_top: f64,
    question: String,
    answer: String,
}

/// POST /api/documents/{id}/annotations
async fn create_annotation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<NewAnnotation>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let offset = match (body.vertical_offset, body.tap_y) {
        (Some(offset), _) => offset,
        (None, Some(tap_y)) => annotation_offset(tap_y, body.pane_top, body.scroll_top),
        (None, None) => return Err(ApiError::bad_request("verticalOffset or tapY is required")),
    };
    let annotation = state
        .store
        .save_annotation(id, offset, &body.question, &body.answer)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!(annotation))))
}

/// DELETE /api/annotations/{id}
async fn delete_annotation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_annotation(id)? {
        return Err(ApiError::not_found(format!("annotation {}", id)));
    }
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_filename("C:\\docs\\a.pdf"), "a.pdf");
        assert_eq!(sanitize_filename("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn test_is_pdf_name() {
        assert!(is_pdf_name("Paper.PDF"));
        assert!(!is_pdf_name(".pdf"));
        assert!(!is_pdf_name("notes.txt"));
    }
}
