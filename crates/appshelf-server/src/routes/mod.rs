//! HTTP route handlers, one module per tool.

pub mod apps;
pub mod library;
pub mod notes;
pub mod quant;
pub mod research;
pub mod settings;
pub mod specs;
pub mod stats;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(apps::routes())
        .merge(stats::routes())
        .merge(settings::routes())
        .merge(library::routes())
        .merge(notes::routes())
        .merge(research::routes())
        .merge(specs::routes())
        .merge(quant::routes())
}
