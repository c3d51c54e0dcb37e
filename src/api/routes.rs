use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Search
        .route("/v1/search", post(handlers::search))
        // Field catalog
        .route("/v1/fields", get(handlers::list_fields))
        .route("/v1/fields", post(handlers::create_field))
        .route("/v1/fields/:id", put(handlers::update_field))
        .route("/v1/fields/:id", delete(handlers::delete_field))
        // Facet intersections
        .route("/v1/intersections", get(handlers::list_intersections))
        .route("/v1/intersections", post(handlers::create_intersection))
        .route("/v1/intersections/:id", delete(handlers::delete_intersection))
        // Content change notifications
        .route("/v1/actions", post(handlers::notify_change))
        .route("/v1/actions", get(handlers::list_actions))
        // Indexing control
        .route("/v1/indexing/run", post(handlers::start_indexing))
        .route("/v1/indexing/status", get(handlers::indexing_status))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                )
                .layer(CorsLayer::permissive()),
        )
}
