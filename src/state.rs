// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    checker::{
        AnswerChecker,
        comparator::ResultComparator,
        gateway::{RemoteGateway, SqlGateway, SqliteGateway},
        regex_match::RegexEvaluator,
    },
    config::Config,
    error::AppError,
    models::challenge::ChallengeBank,
    session::store::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub challenges: Arc<ChallengeBank>,
    pub checker: AnswerChecker,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Loads the dataset and wires the checker to the configured SQL engine.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let challenges = ChallengeBank::load(config.challenges_path.as_deref())?;
        let gateway = build_gateway(&config)?;
        Ok(Self::with_gateway(config, challenges, gateway))
    }

    pub fn with_gateway(config: Config, challenges: ChallengeBank, gateway: Arc<dyn SqlGateway>) -> Self {
        let checker = AnswerChecker::new(
            gateway,
            RegexEvaluator::new(config.regex_size_limit),
            ResultComparator::new(config.column_policy),
        );
        let sessions = Arc::new(SessionStore::new(config.preview_debounce));
        Self {
            config,
            challenges: Arc::new(challenges),
            checker,
            sessions,
        }
    }
}

fn build_gateway(config: &Config) -> Result<Arc<dyn SqlGateway>, AppError> {
    match &config.sql_gateway_url {
        Some(url) => {
            tracing::info!("Using remote SQL gateway at {}", url);
            let gateway = RemoteGateway::new(url.clone(), config.sql_timeout)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            Ok(Arc::new(gateway))
        }
        None => {
            tracing::info!("Using in-memory SQLite gateway");
            Ok(Arc::new(SqliteGateway::new(config.sql_timeout)))
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ChallengeBank> {
    fn from_ref(state: &AppState) -> Self {
        state.challenges.clone()
    }
}

impl FromRef<AppState> for AnswerChecker {
    fn from_ref(state: &AppState) -> Self {
        state.checker.clone()
    }
}
