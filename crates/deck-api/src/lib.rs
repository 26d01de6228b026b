//! # deck-api
//!
//! HTTP API server for promptdeck: a thin axum surface over the card
//! lifecycle engine plus signed serving of stored image objects.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

use axum::http::{header, Method};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router.
///
/// The body limit leaves headroom over the per-file upload ceiling so a
/// two-file multipart request with text fields still fits.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/cards", get(handlers::cards::list_cards))
        .route("/api/cards", post(handlers::cards::create_card))
        .route("/api/cards/export", get(handlers::cards::export_cards))
        .route("/api/cards/:id", put(handlers::cards::update_card))
        .route("/api/cards/:id", delete(handlers::cards::delete_card))
        .route(
            "/api/cards/:id/favorite",
            patch(handlers::cards::set_favorite),
        )
        .route("/api/filter-options", get(handlers::cards::filter_options))
        .route("/files/*path", get(handlers::files::serve_file))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
        .layer(RequestBodyLimitLayer::new(max_upload_bytes * 2 + 1024 * 1024))
        .with_state(state)
}
