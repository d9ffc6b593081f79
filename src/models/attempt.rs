// src/models/attempt.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::challenge::{Difficulty, QuizType};

/// One submission. Append-only; never mutated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// 1-based position of the challenge within the session.
    pub question_number: u32,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub correct: bool,
    /// 1-based count of recorded attempts for this question.
    pub attempt_number: u32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Handed to the client when a session finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub score: u32,
    pub total: u32,
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
    pub answers: Vec<Attempt>,
    /// Question number -> last known outcome.
    pub question_status: BTreeMap<u32, bool>,
    /// Rounded score / total * 100.
    pub percentage: u32,
    pub total_attempts: usize,
}
