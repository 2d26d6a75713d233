use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::session_id::{make_span_with_session_id, session_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        // Session id must be assigned before the trace span is built
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(session_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_session_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(handlers::search))
        .route(
            "/recommendations/current",
            get(handlers::current_recommendations),
        )
        // Per-movie actions
        .route(
            "/movies/:id/recommendations",
            get(handlers::show_recommendations),
        )
        .route("/movies/:id/more", post(handlers::request_more))
}
