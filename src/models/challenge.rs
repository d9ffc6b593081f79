// src/models/challenge.rs

use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Dataset shipped with the binary; `CHALLENGES_PATH` replaces it.
const BUILTIN_CHALLENGES: &str = include_str!("../../data/challenges.json");

/// Number of challenges per tier in the reference content.
pub const CHALLENGES_PER_TIER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    Regex,
    /// Also accepted as `postgresql` in paths and payloads.
    #[serde(alias = "postgresql")]
    Sql,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::Regex => "regex",
            QuizType::Sql => "sql",
        }
    }

    /// Feedback for a blank submission.
    pub fn blank_answer_message(&self) -> &'static str {
        match self {
            QuizType::Regex => "Please enter a regex pattern",
            QuizType::Sql => "Please enter a SQL query",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quiz challenge. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: i64,

    /// Short title shown as the question heading.
    pub question: String,

    pub description: String,

    /// Sample input for regex challenges, a schema description for SQL ones.
    pub test_string: String,

    /// Reference pattern or query.
    pub correct_answer: String,

    #[serde(default)]
    pub hints: Vec<String>,

    /// Schema and data script run before every SQL execution.
    #[serde(default, rename = "setupSQL")]
    pub setup_sql: Option<String>,
}

/// DTO for sending a challenge to the client (excludes the reference answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChallenge {
    pub id: i64,
    pub question: String,
    pub description: String,
    pub test_string: String,
    pub hint_count: usize,
}

impl From<&Challenge> for PublicChallenge {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            question: challenge.question.clone(),
            description: challenge.description.clone(),
            test_string: challenge.test_string.clone(),
            hint_count: challenge.hints.len(),
        }
    }
}

/// Catalogue entry for one quiz type and difficulty.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
    pub challenge_count: usize,
}

/// The full challenge dataset: quiz type -> difficulty -> ordered challenges.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ChallengeBank {
    tiers: BTreeMap<QuizType, BTreeMap<Difficulty, Vec<Challenge>>>,
}

impl ChallengeBank {
    /// Loads the dataset from `path`, or the built-in one when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::InternalServerError(format!(
                        "Failed to read challenges from {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_json(&raw)
            }
            None => Self::from_json(BUILTIN_CHALLENGES),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let bank: ChallengeBank = serde_json::from_str(raw)
            .map_err(|e| AppError::InternalServerError(format!("Invalid challenge dataset: {}", e)))?;
        bank.validate()?;
        Ok(bank)
    }

    fn validate(&self) -> Result<(), AppError> {
        for (quiz_type, difficulties) in &self.tiers {
            for (difficulty, challenges) in difficulties {
                if challenges.is_empty() {
                    return Err(AppError::InternalServerError(format!(
                        "Challenge tier {}/{} is empty",
                        quiz_type, difficulty
                    )));
                }
                if challenges.len() != CHALLENGES_PER_TIER {
                    tracing::warn!(
                        "Challenge tier {}/{} has {} challenges (expected {})",
                        quiz_type,
                        difficulty,
                        challenges.len(),
                        CHALLENGES_PER_TIER
                    );
                }
                if *quiz_type == QuizType::Sql {
                    if let Some(missing) = challenges.iter().find(|c| c.setup_sql.is_none()) {
                        return Err(AppError::InternalServerError(format!(
                            "SQL challenge {} has no setupSQL",
                            missing.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn tier(&self, quiz_type: QuizType, difficulty: Difficulty) -> Option<&[Challenge]> {
        self.tiers
            .get(&quiz_type)
            .and_then(|d| d.get(&difficulty))
            .map(Vec::as_slice)
    }

    pub fn catalogue(&self) -> Vec<TierSummary> {
        self.tiers
            .iter()
            .flat_map(|(quiz_type, difficulties)| {
                difficulties.iter().map(|(difficulty, challenges)| TierSummary {
                    quiz_type: *quiz_type,
                    difficulty: *difficulty,
                    challenge_count: challenges.len(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_dataset_has_every_tier() {
        let bank = ChallengeBank::load(None).unwrap();
        for quiz_type in [QuizType::Regex, QuizType::Sql] {
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                let tier = bank.tier(quiz_type, difficulty).unwrap();
                assert_eq!(tier.len(), CHALLENGES_PER_TIER);
            }
        }
        assert_eq!(bank.catalogue().len(), 6);
    }

    #[test]
    fn builtin_regex_references_compile() {
        let bank = ChallengeBank::load(None).unwrap();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for challenge in bank.tier(QuizType::Regex, difficulty).unwrap() {
                assert!(
                    regex::Regex::new(&challenge.correct_answer).is_ok(),
                    "challenge {} does not compile",
                    challenge.id
                );
            }
        }
    }

    #[tokio::test]
    async fn builtin_sql_references_execute() {
        use crate::checker::gateway::{SqlGateway, SqliteGateway};

        let bank = ChallengeBank::load(None).unwrap();
        let gateway = SqliteGateway::new(std::time::Duration::from_secs(5));
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for challenge in bank.tier(QuizType::Sql, difficulty).unwrap() {
                let result = gateway
                    .run(challenge.setup_sql.as_deref(), &challenge.correct_answer)
                    .await
                    .unwrap_or_else(|e| panic!("challenge {} fails: {}", challenge.id, e));
                assert!(!result.is_empty(), "challenge {} returns no rows", challenge.id);
            }
        }
    }

    #[test]
    fn postgresql_is_an_alias_for_sql() {
        let quiz_type: QuizType = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(quiz_type, QuizType::Sql);
    }

    #[test]
    fn sql_challenge_without_setup_is_rejected() {
        let raw = r#"{ "sql": { "easy": [ {
            "id": 1, "question": "q", "description": "d",
            "testString": "t", "correctAnswer": "SELECT 1"
        } ] } }"#;
        assert!(ChallengeBank::from_json(raw).is_err());
    }

    #[test]
    fn empty_tier_is_rejected() {
        assert!(ChallengeBank::from_json(r#"{ "regex": { "easy": [] } }"#).is_err());
    }
}
