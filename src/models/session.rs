// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    checker::{CheckOutcome, Verdict},
    models::{
        attempt::{Attempt, ResultsSummary},
        challenge::{Difficulty, PublicChallenge, QuizType},
        execution::ExecuteSqlResponse,
    },
    session::quiz::{QuizSession, SessionState},
};

/// DTO for starting a quiz.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
}

/// DTO for submitting an answer to the current question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(max = 10000))]
    pub answer: String,
}

/// DTO for live feedback on a partially typed answer.
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub input: String,
}

/// Snapshot of a session for the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub state: SessionState,
    pub question_number: Option<u32>,
    pub total: u32,
    pub score: u32,
    pub challenge: Option<PublicChallenge>,
    /// Present once the current question has been checked.
    pub last_verdict: Option<Verdict>,
}

impl SessionView {
    pub fn new(id: Uuid, session: &QuizSession) -> Self {
        Self {
            id,
            quiz_type: session.quiz_type(),
            difficulty: session.difficulty(),
            state: session.state(),
            question_number: session.question_number(),
            total: session.total(),
            score: session.score(),
            challenge: session.current_challenge().map(PublicChallenge::from),
            last_verdict: session.last_verdict(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    /// Absent when an errored submission was not logged.
    pub attempt: Option<Attempt>,
    pub score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub session: SessionView,
    /// Present once the last question is behind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ResultsSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintsResponse {
    pub question_number: u32,
    pub hints: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// SQL only: sequence number of the latest scheduled evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// Question the evaluation was scheduled for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
    /// Whether `matches` or `result` reflect the latest input.
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecuteSqlResponse>,
    /// Text rendering of `result` rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}
