pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.upload_limit);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        // v1: raw inputs, full aggregation
        .route(
            "/api/v1/generate-email",
            post(handlers::handle_generate_email).layer(upload_limit),
        )
        .route(
            "/api/v1/generate-referral",
            post(handlers::handle_generate_referral).layer(upload_limit),
        )
        .route("/api/v1/jd-from-url", post(handlers::handle_jd_from_url))
        .route("/api/v1/jd-from-text", post(handlers::handle_jd_from_text))
        .route("/api/v1/linkedin", post(handlers::handle_profile))
        .route(
            "/api/v1/resume",
            post(handlers::handle_resume).layer(upload_limit),
        )
        // v2: resolved context, synthesis only
        .route(
            "/api/v2/generate-email",
            post(handlers::handle_generate_email_v2),
        )
        .route(
            "/api/v2/generate-referral",
            post(handlers::handle_generate_referral_v2),
        )
        .with_state(state)
}
