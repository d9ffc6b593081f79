// src/config.rs

use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use dotenvy::dotenv;
use url::Url;

use crate::{
    checker::comparator::ColumnPolicy,
    error::AppError,
    session::quiz::{ScoringPolicy, ScoringRule},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    /// Replaces the built-in challenge dataset when set.
    pub challenges_path: Option<PathBuf>,
    /// Remote SQL execution service; the local SQLite engine is used when unset.
    pub sql_gateway_url: Option<Url>,
    pub sql_timeout: Duration,
    pub preview_debounce: Duration,
    pub regex_size_limit: usize,
    pub column_policy: ColumnPolicy,
    pub scoring: ScoringPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            challenges_path: None,
            sql_gateway_url: None,
            sql_timeout: Duration::from_secs(5),
            preview_debounce: Duration::from_millis(1000),
            regex_size_limit: 1 << 20,
            column_policy: ColumnPolicy::Strict,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let defaults = Self::default();

        let bind_addr = parse_var("BIND_ADDR", defaults.bind_addr)?;

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let challenges_path = env::var("CHALLENGES_PATH").ok().map(PathBuf::from);

        let sql_gateway_url = match env::var("SQL_GATEWAY_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim()).map_err(|e| {
                AppError::InternalServerError(format!("SQL_GATEWAY_URL is not a valid URL: {}", e))
            })?),
            _ => None,
        };

        let sql_timeout = Duration::from_secs(parse_var("SQL_TIMEOUT_SECS", 5u64)?);

        let preview_debounce = Duration::from_millis(parse_var("PREVIEW_DEBOUNCE_MS", 1000u64)?);

        let regex_size_limit = parse_var("REGEX_SIZE_LIMIT", defaults.regex_size_limit)?;

        let column_policy = parse_var("COLUMN_POLICY", defaults.column_policy)?;

        let scoring = ScoringPolicy {
            rule: parse_var("SCORING_RULE", ScoringRule::FirstCorrect)?,
            errored_consumes_attempt: parse_var("ERRORED_CONSUMES_ATTEMPT", false)?,
        };

        Ok(Self {
            bind_addr,
            rust_log,
            log_dir,
            challenges_path,
            sql_gateway_url,
            sql_timeout,
            preview_debounce,
            regex_size_limit,
            column_policy,
            scoring,
        })
    }
}

/// Reads `key`, falling back to `default` when it is unset or blank.
fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("{} is invalid: {}", key, e))),
        _ => Ok(default),
    }
}
