//! Route configuration and setup

use crate::auth::{auth_middleware, AuthState};
use crate::constants::{API_PREFIX, MAX_BODY_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use claiss_core::Config;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// Every route, health included, sits behind the bearer gate.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let auth_state = Arc::new(AuthState::new(config.base.api_secret_key.clone()));

    let api_routes = api_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    Router::new()
        .nest(API_PREFIX, api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/compile", post(handlers::compile::compile_scene))
        .route(
            "/video-merge",
            post(handlers::video_merge::merge_videos).get(handlers::video_merge::merge_capabilities),
        )
        .route(
            "/videos",
            get(handlers::videos::get_video).head(handlers::videos::head_video),
        )
}
