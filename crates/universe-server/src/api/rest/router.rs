//! Router creation and configuration
//!
//! Creates the Axum router for the REST API endpoints.

use super::handlers::*;
use super::types::AppState;
use crate::error::expose_error_detail;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upper bound for `generate-bot` forms, training file included
const BOT_FORM_LIMIT: usize = 5 * 1024 * 1024;

/// Create REST API router
pub fn create_router(state: AppState) -> Router {
    let dev_mode = state.dev_mode;

    Router::new()
        .route("/health", get(health))
        .route("/api/prompts/generate-questions", post(generate_questions))
        .route("/api/prompts/save-flow/:project_id", post(save_flow))
        .route("/api/prompts/flow/:project_id", get(get_flow))
        .route("/api/prompts/flow/:project_id/versions", get(list_flow_versions))
        .route("/api/prompts/generate-flow/:project_id", post(generate_flow))
        .route(
            "/api/prompts/generate-bot",
            post(generate_bot).layer(DefaultBodyLimit::max(BOT_FORM_LIMIT)),
        )
        .route("/api/prompts/generation-status/:session_id", get(generation_status))
        .route("/api/projects", post(create_project).get(list_projects))
        .route(
            "/api/projects/:project_id",
            get(get_project).delete(delete_project),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(dev_mode, expose_error_detail))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
