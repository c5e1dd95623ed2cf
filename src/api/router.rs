use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, get_available, get_user_loans, list_overdue, list_reserved, return_book, take_book,
};

/// Creates the public API router
///
/// Command endpoints (Write operations):
/// - POST /api/v1/book/:book_id/take - Take a book
/// - POST /api/v1/book/:book_id/return - Return a book
///
/// Query endpoints (Read operations):
/// - GET /api/v1/book/:book_id/avail - Available copies
/// - GET /api/v1/reserved - Loans active at a point in time
/// - GET /api/v1/overdue - Loans overdue at a point in time
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/api/v1/book/:book_id/take", post(take_book))
        .route("/api/v1/book/:book_id/return", post(return_book))
        // Query endpoints (Read operations)
        .route("/api/v1/book/:book_id/avail", get(get_available))
        .route("/api/v1/reserved", get(list_reserved))
        .route("/api/v1/overdue", get(list_overdue))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Creates the internal API router
///
/// These endpoints skip authorization and must only be bound to a trusted network.
/// - GET /api/v1/userloans/:user_id - Unreturned loan count for a user
pub fn create_internal_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/userloans/:user_id", get(get_user_loans))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
