// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{challenges, preview, session, sql},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (challenges, SQL execution, sessions).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let challenge_routes = Router::new()
        .route("/", get(challenges::list_catalogue))
        .route("/{quiz_type}/{difficulty}", get(challenges::list_tier));

    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route("/{id}", get(session::get_session))
        .route("/{id}/answer", post(session::submit_answer))
        .route("/{id}/next", post(session::next_question))
        .route("/{id}/skip", post(session::skip_question))
        .route("/{id}/hints", get(session::get_hints))
        .route(
            "/{id}/preview",
            post(preview::submit_preview).get(preview::get_preview),
        );

    Router::new()
        .nest("/api/challenges", challenge_routes)
        .nest("/api/sessions", session_routes)
        .route("/api/execute-sql", post(sql::execute_sql))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
