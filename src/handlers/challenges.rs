// src/handlers/challenges.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::challenge::{ChallengeBank, Difficulty, PublicChallenge, QuizType},
};

/// Lists every quiz type and difficulty with its challenge count.
pub async fn list_catalogue(State(bank): State<Arc<ChallengeBank>>) -> impl IntoResponse {
    Json(bank.catalogue())
}

/// Lists the challenges of one tier without their reference answers.
pub async fn list_tier(
    State(bank): State<Arc<ChallengeBank>>,
    Path((quiz_type, difficulty)): Path<(QuizType, Difficulty)>,
) -> Result<impl IntoResponse, AppError> {
    let challenges = bank.tier(quiz_type, difficulty).ok_or_else(|| {
        AppError::NotFound(format!("No {} challenges for {}", quiz_type, difficulty))
    })?;

    let public: Vec<PublicChallenge> = challenges.iter().map(PublicChallenge::from).collect();
    Ok(Json(public))
}
