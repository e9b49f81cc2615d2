//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway sits in front of the built frontend. API and error-page routes
//! are matched first; every other path falls through to the page service,
//! which runs the guard middleware before serving static files. Unknown paths
//! get `index.html` so client-side routing still works.

pub mod access;
pub mod errors;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full gateway router: API routes, error pages, and guarded static pages.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    let pages = Router::new()
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(state.clone(), access::require_access));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/guard/check", get(access::check).layer(cors))
        .route("/error/{code}", get(errors::error_page))
        .with_state(state)
        .fallback_service(pages)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
