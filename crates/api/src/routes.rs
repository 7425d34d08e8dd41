//! API Routes

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Queries
        .route("/api/effective-rules", get(handlers::effective_rules))
        .route("/api/compliance", get(handlers::compliance))
        .route("/api/partial-compliance", get(handlers::partial_compliance))
        .route("/api/documents", get(handlers::documents))

        // Rule administration
        .route("/api/rules", post(handlers::create_rule))
        .route(
            "/api/rules/:id",
            patch(handlers::update_rule).delete(handlers::delete_rule),
        )

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
