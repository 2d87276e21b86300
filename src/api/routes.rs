//! HTTP API Route Definitions

use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Both spellings, with and without the trailing slash
        .route("/scrape", get(handlers::scrape))
        .route("/scrape/", get(handlers::scrape))
        .route("/trending", get(handlers::trending))
        .route("/trending/", get(handlers::trending))
        .route("/trending_keywords", get(handlers::trending))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
