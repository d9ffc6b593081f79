// src/session/quiz.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Serialize;

use crate::{
    checker::Verdict,
    error::AppError,
    models::{
        attempt::{Attempt, ResultsSummary},
        challenge::{Challenge, Difficulty, QuizType},
    },
};

/// When a correct submission earns a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    /// The first correct attempt for a question scores, however many misses preceded it.
    FirstCorrect,
    /// Only a correct first attempt scores.
    FirstAttempt,
}

impl FromStr for ScoringRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first_correct" => Ok(ScoringRule::FirstCorrect),
            "first_attempt" => Ok(ScoringRule::FirstAttempt),
            other => Err(format!(
                "unknown scoring rule '{}' (expected first_correct or first_attempt)",
                other
            )),
        }
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringRule::FirstCorrect => f.write_str("first_correct"),
            ScoringRule::FirstAttempt => f.write_str("first_attempt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub rule: ScoringRule,
    /// Whether an errored submission is logged as a (failed) attempt.
    pub errored_consumes_attempt: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            rule: ScoringRule::FirstCorrect,
            errored_consumes_attempt: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "questionIndex", rename_all = "snake_case")]
pub enum SessionState {
    InProgress(usize),
    Finished,
}

/// One user's run through a tier of challenges.
#[derive(Debug)]
pub struct QuizSession {
    quiz_type: QuizType,
    difficulty: Difficulty,
    challenges: Vec<Challenge>,
    state: SessionState,
    score: u32,
    answers: Vec<Attempt>,
    question_status: BTreeMap<u32, bool>,
    last_verdict: Option<Verdict>,
    policy: ScoringPolicy,
}

impl QuizSession {
    pub fn new(
        quiz_type: QuizType,
        difficulty: Difficulty,
        challenges: Vec<Challenge>,
        policy: ScoringPolicy,
    ) -> Self {
        let state = if challenges.is_empty() {
            SessionState::Finished
        } else {
            SessionState::InProgress(0)
        };
        Self {
            quiz_type,
            difficulty,
            challenges,
            state,
            score: 0,
            answers: Vec::new(),
            question_status: BTreeMap::new(),
            last_verdict: None,
            policy,
        }
    }

    pub fn quiz_type(&self) -> QuizType {
        self.quiz_type
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.challenges.len() as u32
    }

    pub fn answers(&self) -> &[Attempt] {
        &self.answers
    }

    pub fn question_status(&self) -> &BTreeMap<u32, bool> {
        &self.question_status
    }

    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    pub fn current_challenge(&self) -> Option<&Challenge> {
        match self.state {
            SessionState::InProgress(index) => self.challenges.get(index),
            SessionState::Finished => None,
        }
    }

    /// 1-based number of the current question.
    pub fn question_number(&self) -> Option<u32> {
        match self.state {
            SessionState::InProgress(index) => Some(index as u32 + 1),
            SessionState::Finished => None,
        }
    }

    fn in_progress(&self) -> Result<(u32, &Challenge), AppError> {
        match (self.question_number(), self.current_challenge()) {
            (Some(number), Some(challenge)) => Ok((number, challenge)),
            _ => Err(AppError::Conflict("Quiz is already finished".to_string())),
        }
    }

    /// Records a checked submission for the current question.
    ///
    /// Returns the logged attempt, or `None` when an errored verdict is not
    /// logged under the current policy.
    pub fn record(&mut self, user_answer: &str, verdict: Verdict) -> Result<Option<&Attempt>, AppError> {
        let (question_number, challenge) = self.in_progress()?;
        let question = challenge.question.clone();
        let correct_answer = challenge.correct_answer.clone();

        self.last_verdict = Some(verdict);

        if verdict.is_errored() && !self.policy.errored_consumes_attempt {
            tracing::debug!("Errored submission for question {} not logged", question_number);
            return Ok(None);
        }

        let correct = verdict.is_correct();
        let previous: Vec<&Attempt> = self
            .answers
            .iter()
            .filter(|a| a.question_number == question_number)
            .collect();
        let attempt_number = previous.len() as u32 + 1;
        let already_scored = previous.iter().any(|a| a.correct);

        let earns_point = correct
            && !already_scored
            && match self.policy.rule {
                ScoringRule::FirstCorrect => true,
                ScoringRule::FirstAttempt => attempt_number == 1,
            };
        if earns_point {
            self.score += 1;
            tracing::info!(
                "Question {} scored, total {}/{}",
                question_number,
                self.score,
                self.total()
            );
        }

        self.question_status.insert(question_number, correct);

        self.answers.push(Attempt {
            question_number,
            question,
            user_answer: user_answer.to_string(),
            correct_answer,
            correct,
            attempt_number,
            submitted_at: chrono::Utc::now(),
        });
        Ok(self.answers.last())
    }

    /// Moves to the next question. Requires a verdict for the current one.
    pub fn next(&mut self) -> Result<SessionState, AppError> {
        self.in_progress()?;
        if self.last_verdict.is_none() {
            return Err(AppError::Conflict(
                "Check an answer before moving on".to_string(),
            ));
        }
        Ok(self.advance())
    }

    /// Moves on without a verdict; the question counts as failed if never answered.
    pub fn skip(&mut self) -> Result<SessionState, AppError> {
        let (question_number, _) = self.in_progress()?;
        self.question_status.entry(question_number).or_insert(false);
        Ok(self.advance())
    }

    fn advance(&mut self) -> SessionState {
        self.last_verdict = None;
        self.state = match self.state {
            SessionState::InProgress(index) if index + 1 < self.challenges.len() => {
                SessionState::InProgress(index + 1)
            }
            _ => SessionState::Finished,
        };
        self.state
    }

    pub fn summary(&self) -> ResultsSummary {
        let total = self.total();
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(self.score) / f64::from(total) * 100.0).round() as u32
        };
        ResultsSummary {
            score: self.score,
            total,
            difficulty: self.difficulty,
            quiz_type: self.quiz_type,
            answers: self.answers.clone(),
            question_status: self.question_status.clone(),
            percentage,
            total_attempts: self.answers.len(),
        }
    }
}
