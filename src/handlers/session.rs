// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{
        AdvanceResponse, AnswerResponse, CreateSessionRequest, HintsResponse, SessionView,
        SubmitAnswerRequest,
    },
    session::quiz::{QuizSession, SessionState},
    state::AppState,
};

/// Starts a session over one tier of challenges.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let challenges = state
        .challenges
        .tier(req.quiz_type, req.difficulty)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No {} challenges for {}",
                req.quiz_type, req.difficulty
            ))
        })?
        .to_vec();

    let session = QuizSession::new(req.quiz_type, req.difficulty, challenges, state.config.scoring);
    let (id, handle) = state.sessions.create(session).await;
    let session = handle.session.lock().await;

    Ok((StatusCode::CREATED, Json(SessionView::new(id, &session))))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.session.lock().await;
    Ok(Json(SessionView::new(id, &session)))
}

/// Checks an answer for the current question and records the attempt.
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let handle = state.sessions.get(id).await?;
    let mut session = handle.session.lock().await;

    if req.answer.trim().is_empty() {
        return Err(AppError::BadRequest(
            session.quiz_type().blank_answer_message().to_string(),
        ));
    }

    let challenge = session
        .current_challenge()
        .cloned()
        .ok_or_else(|| AppError::Conflict("Quiz is already finished".to_string()))?;

    let outcome = state
        .checker
        .check(session.quiz_type(), &challenge, &req.answer)
        .await;

    let attempt = session.record(&req.answer, outcome.verdict)?.cloned();

    Ok(Json(AnswerResponse {
        outcome,
        attempt,
        score: session.score(),
    }))
}

/// Advances after a verdict; finishing returns the results summary and discards the session.
pub async fn next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    advance(state, id, false).await
}

/// Advances without a verdict.
pub async fn skip_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    advance(state, id, true).await
}

async fn advance(state: AppState, id: Uuid, skip: bool) -> Result<Json<AdvanceResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.session.lock().await;

    let next = if skip { session.skip()? } else { session.next()? };
    handle.preview.reset().await;

    let summary = match next {
        SessionState::Finished => Some(session.summary()),
        SessionState::InProgress(_) => None,
    };
    let view = SessionView::new(id, &session);
    drop(session);

    if let Some(summary) = &summary {
        tracing::info!(
            "Session {} finished with {}/{}",
            id,
            summary.score,
            summary.total
        );
        state.sessions.remove(id).await;
    }

    Ok(Json(AdvanceResponse {
        session: view,
        summary,
    }))
}

pub async fn get_hints(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.session.lock().await;

    match (session.question_number(), session.current_challenge()) {
        (Some(question_number), Some(challenge)) => Ok(Json(HintsResponse {
            question_number,
            hints: challenge.hints.clone(),
        })),
        _ => Err(AppError::Conflict("Quiz is already finished".to_string())),
    }
}
