// src/handlers/preview.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        challenge::QuizType,
        execution::ExecuteSqlResponse,
        session::{PreviewRequest, PreviewResponse},
    },
    state::AppState,
    utils::format::{format_results, join_matches},
};

/// Live feedback while the user types.
///
/// Regex input is evaluated right away. SQL input is debounced: the call
/// returns the sequence number of the scheduled run, and the result is
/// fetched with `get_preview`.
pub async fn submit_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let handle = state.sessions.get(id).await?;
    // Held until the run is scheduled so `next`/`skip` cannot reset in between.
    let session = handle.session.lock().await;
    let challenge = session
        .current_challenge()
        .cloned()
        .ok_or_else(|| AppError::Conflict("Quiz is already finished".to_string()))?;
    let quiz_type = session.quiz_type();
    let question_number = session.question_number();

    if req.input.is_empty() || (quiz_type == QuizType::Sql && req.input.trim().is_empty()) {
        handle.preview.reset().await;
        return Ok(Json(PreviewResponse::default()));
    }

    let response = match quiz_type {
        QuizType::Regex => {
            let matches = state
                .checker
                .regex()
                .matches(&req.input, &challenge.test_string);
            PreviewResponse {
                ready: true,
                feedback: Some(format!("Your pattern matches: {}", join_matches(&matches))),
                matches: Some(matches),
                ..PreviewResponse::default()
            }
        }
        QuizType::Sql => {
            let gateway = Arc::clone(state.checker.gateway());
            let setup = challenge.setup_sql.clone();
            let query = req.input;
            let seq = handle
                .preview
                .schedule(move || async move {
                    match gateway.run(setup.as_deref(), &query).await {
                        Ok(rows) => ExecuteSqlResponse::ok(rows),
                        Err(e) => ExecuteSqlResponse::failed(e.to_string()),
                    }
                })
                .await;
            tracing::debug!("Session {} scheduled SQL preview #{}", id, seq);
            PreviewResponse {
                seq: Some(seq),
                question_number,
                ..PreviewResponse::default()
            }
        }
    };
    drop(session);

    Ok(Json(response))
}

/// Latest SQL preview result, if it belongs to the most recent input.
pub async fn get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(id).await?;
    let seq = handle.preview.issued();

    let response = match handle.preview.latest().await {
        Some(tagged) => PreviewResponse {
            seq: Some(tagged.seq),
            ready: true,
            table: tagged.value.data.as_ref().map(format_results),
            feedback: tagged.value.error.clone(),
            result: Some(tagged.value),
            ..PreviewResponse::default()
        },
        None => PreviewResponse {
            seq: Some(seq),
            ..PreviewResponse::default()
        },
    };

    Ok(Json(response))
}
