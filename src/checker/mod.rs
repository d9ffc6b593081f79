// src/checker/mod.rs

//! Answer-equivalence engine.
//!
//! Regex answers are judged by their match set on the challenge's sample text.
//! SQL answers are judged by the rows they return from the challenge's setup data.

pub mod comparator;
pub mod gateway;
pub mod regex_match;

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    checker::{
        comparator::ResultComparator,
        gateway::{GatewayError, SqlGateway},
        regex_match::{RegexEvaluator, match_sets_agree},
    },
    models::{
        challenge::{Challenge, QuizType},
        result_set::ResultSet,
    },
    utils::format::join_matches,
};

pub const CORRECT_FEEDBACK: &str = "Correct! Well done!";
pub const REFERENCE_FAILURE_FEEDBACK: &str = "Internal error: Could not execute expected query";
pub const NETWORK_FAILURE_FEEDBACK: &str =
    "Could not reach the SQL execution service. Please try again.";

/// Failures caught at the checker boundary.
///
/// Invalid regex patterns are not here: they degrade to an empty match set.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The user's query failed. Carries the engine's text.
    QueryExecution(String),
    /// The reference query failed, which is a dataset defect.
    ReferenceExecution(String),
    /// The execution service was unreachable.
    Network(String),
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::QueryExecution(_) => ErrorKind::QueryExecution,
            CheckError::ReferenceExecution(_) => ErrorKind::ReferenceExecution,
            CheckError::Network(_) => ErrorKind::Network,
        }
    }

    /// Text shown to the user.
    pub fn feedback(&self) -> String {
        match self {
            CheckError::QueryExecution(msg) => format!("SQL Error: {}", msg),
            CheckError::ReferenceExecution(_) => REFERENCE_FAILURE_FEEDBACK.to_string(),
            CheckError::Network(_) => NETWORK_FAILURE_FEEDBACK.to_string(),
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::QueryExecution(msg) => write!(f, "user query failed: {}", msg),
            CheckError::ReferenceExecution(msg) => write!(f, "reference query failed: {}", msg),
            CheckError::Network(msg) => write!(f, "gateway unreachable: {}", msg),
        }
    }
}

impl std::error::Error for CheckError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QueryExecution,
    ReferenceExecution,
    Network,
}

/// Terminal state of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Errored { kind: ErrorKind },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Verdict::Errored { .. })
    }
}

/// Verdict plus what the user needs to see about it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub feedback: String,
    /// Regex only: what the user's pattern matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_matches: Option<Vec<String>>,
    /// SQL only: the rows the user's query returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_result: Option<ResultSet>,
    /// SQL only: how many rows the reference returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_row_count: Option<usize>,
    /// SQL only: reference columns the user's query did not select.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_columns: Vec<String>,
    /// SQL only: user columns the reference does not select.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_columns: Vec<String>,
}

impl CheckOutcome {
    fn new(verdict: Verdict, feedback: impl Into<String>) -> Self {
        Self {
            verdict,
            feedback: feedback.into(),
            user_matches: None,
            user_result: None,
            expected_row_count: None,
            missing_columns: Vec::new(),
            extra_columns: Vec::new(),
        }
    }

    fn errored(err: &CheckError) -> Self {
        Self::new(Verdict::Errored { kind: err.kind() }, err.feedback())
    }
}

/// Picks the evaluator by quiz type and renders the verdict.
#[derive(Clone)]
pub struct AnswerChecker {
    gateway: Arc<dyn SqlGateway>,
    regex: RegexEvaluator,
    comparator: ResultComparator,
}

impl AnswerChecker {
    pub fn new(gateway: Arc<dyn SqlGateway>, regex: RegexEvaluator, comparator: ResultComparator) -> Self {
        Self {
            gateway,
            regex,
            comparator,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn SqlGateway> {
        &self.gateway
    }

    pub fn regex(&self) -> &RegexEvaluator {
        &self.regex
    }

    pub async fn check(&self, quiz_type: QuizType, challenge: &Challenge, answer: &str) -> CheckOutcome {
        let outcome = match quiz_type {
            QuizType::Regex => self.check_regex(challenge, answer),
            QuizType::Sql => self.check_sql(challenge, answer).await,
        };
        tracing::debug!(
            "Checked {} challenge {}: {:?}",
            quiz_type,
            challenge.id,
            outcome.verdict
        );
        outcome
    }

    /// Never errors: a malformed pattern simply matches nothing.
    pub fn check_regex(&self, challenge: &Challenge, pattern: &str) -> CheckOutcome {
        let user_matches = self.regex.matches(pattern, &challenge.test_string);
        let reference_matches = self.regex.matches(&challenge.correct_answer, &challenge.test_string);

        let mut outcome = if match_sets_agree(&user_matches, &reference_matches) {
            CheckOutcome::new(Verdict::Correct, CORRECT_FEEDBACK)
        } else {
            CheckOutcome::new(
                Verdict::Incorrect,
                format!("Incorrect. Your pattern matched: {}", join_matches(&user_matches)),
            )
        };
        outcome.user_matches = Some(user_matches);
        outcome
    }

    pub async fn check_sql(&self, challenge: &Challenge, query: &str) -> CheckOutcome {
        let setup = challenge.setup_sql.as_deref();

        // Both runs must finish before a verdict exists.
        let (user, reference) = tokio::join!(
            self.gateway.run(setup, query),
            self.gateway.run(setup, &challenge.correct_answer),
        );

        let user = match user {
            Ok(rows) => rows,
            Err(GatewayError::Execution(msg)) => {
                return CheckOutcome::errored(&CheckError::QueryExecution(msg));
            }
            Err(GatewayError::Network(msg)) => {
                return CheckOutcome::errored(&CheckError::Network(msg));
            }
        };

        let reference = match reference {
            Ok(rows) => rows,
            Err(GatewayError::Execution(msg)) => {
                tracing::error!(
                    "Reference query of challenge {} failed: {}",
                    challenge.id,
                    msg
                );
                return CheckOutcome::errored(&CheckError::ReferenceExecution(msg));
            }
            Err(GatewayError::Network(msg)) => {
                return CheckOutcome::errored(&CheckError::Network(msg));
            }
        };

        let mut outcome = if self.comparator.equivalent(&user, &reference) {
            CheckOutcome::new(Verdict::Correct, CORRECT_FEEDBACK)
        } else {
            let mut outcome = CheckOutcome::new(
                Verdict::Incorrect,
                format!(
                    "Incorrect. Your query returned different results. Expected {} rows, got {} rows.",
                    reference.len(),
                    user.len()
                ),
            );
            outcome.missing_columns = self.comparator.missing_columns(&user, &reference);
            outcome.extra_columns = self.comparator.extra_columns(&user, &reference);
            outcome
        };
        outcome.expected_row_count = Some(reference.len());
        outcome.user_result = Some(user);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{checker::gateway::SqliteGateway, models::result_set::Scalar};

    const USERS_SETUP: &str = "
        CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT, age INTEGER);
        INSERT INTO users VALUES (1, 'A', 'a@x.com', 20);
    ";

    fn challenge(test_string: &str, answer: &str, setup: Option<&str>) -> Challenge {
        Challenge {
            id: 1,
            question: "q".into(),
            description: "d".into(),
            test_string: test_string.into(),
            correct_answer: answer.into(),
            hints: vec![],
            setup_sql: setup.map(str::to_string),
        }
    }

    fn sqlite_checker() -> AnswerChecker {
        AnswerChecker::new(
            Arc::new(SqliteGateway::new(Duration::from_secs(5))),
            RegexEvaluator::default(),
            ResultComparator::default(),
        )
    }

    struct Unreachable;

    #[async_trait]
    impl SqlGateway for Unreachable {
        async fn run(&self, _setup: Option<&str>, _query: &str) -> Result<ResultSet, GatewayError> {
            Err(GatewayError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn regex_digits_are_correct() {
        let c = challenge("The year 2023 has 4 digits", r"\d", None);
        let outcome = sqlite_checker().check(QuizType::Regex, &c, r"\d").await;
        assert_eq!(outcome.verdict, Verdict::Correct);
        assert_eq!(outcome.user_matches.unwrap(), vec!["2", "0", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn invalid_regex_is_incorrect_not_errored() {
        let c = challenge("The year 2023 has 4 digits", r"\d", None);
        let outcome = sqlite_checker().check(QuizType::Regex, &c, r"(\d").await;
        assert_eq!(outcome.verdict, Verdict::Incorrect);
        assert_eq!(outcome.feedback, "Incorrect. Your pattern matched: nothing");
    }

    #[tokio::test]
    async fn regex_feedback_lists_user_matches() {
        let c = challenge("The year 2023 has 4 digits", r"\d", None);
        let outcome = sqlite_checker().check(QuizType::Regex, &c, r"\d+").await;
        assert_eq!(outcome.feedback, "Incorrect. Your pattern matched: 2023, 4");
    }

    #[tokio::test]
    async fn identical_sql_is_correct() {
        let c = challenge("users", "SELECT name, email FROM users", Some(USERS_SETUP));
        let outcome = sqlite_checker()
            .check(QuizType::Sql, &c, "SELECT name, email FROM users")
            .await;
        assert_eq!(outcome.verdict, Verdict::Correct);
        let rows = outcome.user_result.unwrap();
        assert_eq!(rows.rows()[0]["email"], Scalar::Text("a@x.com".into()));
    }

    #[tokio::test]
    async fn reordered_columns_are_correct() {
        let c = challenge("users", "SELECT name, email FROM users", Some(USERS_SETUP));
        let outcome = sqlite_checker()
            .check(QuizType::Sql, &c, "select email, name from users order by name desc")
            .await;
        assert_eq!(outcome.verdict, Verdict::Correct);
    }

    #[tokio::test]
    async fn omitted_column_is_incorrect() {
        let c = challenge("users", "SELECT name, email FROM users", Some(USERS_SETUP));
        let outcome = sqlite_checker()
            .check(QuizType::Sql, &c, "SELECT name FROM users")
            .await;
        assert_eq!(outcome.verdict, Verdict::Incorrect);
        assert_eq!(outcome.missing_columns, vec!["email".to_string()]);
        assert_eq!(outcome.expected_row_count, Some(1));
    }

    #[tokio::test]
    async fn user_sql_error_is_surfaced_verbatim() {
        let c = challenge("users", "SELECT name FROM users", Some(USERS_SETUP));
        let outcome = sqlite_checker()
            .check(QuizType::Sql, &c, "SELECT nope FROM users")
            .await;
        assert_eq!(
            outcome.verdict,
            Verdict::Errored {
                kind: ErrorKind::QueryExecution
            }
        );
        assert_eq!(outcome.feedback, "SQL Error: no such column: nope");
    }

    #[tokio::test]
    async fn broken_reference_is_an_internal_error() {
        let c = challenge("users", "SELECT * FROM missing_table", Some(USERS_SETUP));
        let outcome = sqlite_checker()
            .check(QuizType::Sql, &c, "SELECT * FROM users")
            .await;
        assert_eq!(
            outcome.verdict,
            Verdict::Errored {
                kind: ErrorKind::ReferenceExecution
            }
        );
        assert_eq!(outcome.feedback, REFERENCE_FAILURE_FEEDBACK);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_network_error() {
        let checker = AnswerChecker::new(
            Arc::new(Unreachable),
            RegexEvaluator::default(),
            ResultComparator::default(),
        );
        let c = challenge("users", "SELECT 1", Some(USERS_SETUP));
        let outcome = checker.check(QuizType::Sql, &c, "SELECT 1").await;
        assert!(outcome.verdict.is_errored());
        assert_eq!(outcome.feedback, NETWORK_FAILURE_FEEDBACK);
    }

    #[test]
    fn verdict_serializes_with_tag() {
        let json = serde_json::to_value(Verdict::Errored {
            kind: ErrorKind::Network,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "verdict": "errored", "kind": "network" }));
    }
}
