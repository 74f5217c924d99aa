//! Theme and typography settings.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use appshelf_core::settings::SLIDERS;
use appshelf_core::{Settings, Theme, Typography};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/theme/toggle", post(toggle_theme))
        .route("/settings/typography/css", get(typography_css))
        .route("/settings/typography/reset", post(reset_typography))
}

fn settings_json(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "theme": settings.theme,
        "dataTheme": settings.theme.data_attribute(),
        "typography": settings.typography,
        "cssVars": settings.typography.css_vars()
            .into_iter()
            .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
            .collect::<Vec<_>>(),
        "sliders": SLIDERS,
    })
}

/// GET /api/settings
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(settings_json(&state.settings.read()))
}

#[derive(Debug, Deserialize)]
struct SettingsUpdate {
    theme: Option<Theme>,
    typography: Option<Typography>,
}

/// PUT /api/settings — replace theme and/or typography. Typography is clamped.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettingsUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut settings = state.settings.write();
    let mut next = *settings;
    if let Some(theme) = body.theme {
        next.theme = theme;
    }
    if let Some(typography) = body.typography {
        next.typography = typography.clamped();
    }
    next.save(state.store.as_ref())?;
    *settings = next;
    info!("Settings updated: theme={}", next.theme);
    Ok(Json(settings_json(&settings)))
}

/// POST /api/settings/theme/toggle
async fn toggle_theme(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let theme = state.settings.write().toggle_theme(state.store.as_ref())?;
    Ok(Json(serde_json::json!({
        "theme": theme,
        "dataTheme": theme.data_attribute(),
    })))
}

/// GET /api/settings/typography/css — the typography as a stylesheet rule.
async fn typography_css(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let declarations = state.settings.read().typography.css_declarations();
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        format!(".spec-markdown {{ {} }}\n", declarations),
    )
}

/// POST /api/settings/typography/reset
async fn reset_typography(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let mut settings = state.settings.write();
    settings.set_typography(Typography::default(), state.store.as_ref())?;
    Ok(Json(settings_json(&settings)))
}
