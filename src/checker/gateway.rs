// src/checker/gateway.rs

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use sqlx::{
    Column, ConnectOptions, Connection, Decode, Executor, Row as _, Sqlite, TypeInfo, ValueRef,
    sqlite::{SqliteConnectOptions, SqliteRow, SqliteValueRef},
};
use url::Url;

use crate::models::{
    execution::{ExecuteSqlRequest, ExecuteSqlResponse},
    result_set::{ResultSet, Row, Scalar},
};

/// Why a gateway call produced no rows.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The engine rejected the setup script or the query. Carries its diagnostic text.
    Execution(String),
    /// The execution service could not be reached or answered garbage.
    Network(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Execution(msg) => f.write_str(msg),
            GatewayError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Runs one query against a throwaway database built from `setup`.
///
/// Implementations never share state between calls.
#[async_trait]
pub trait SqlGateway: Send + Sync {
    async fn run(&self, setup: Option<&str>, query: &str) -> Result<ResultSet, GatewayError>;
}

/// Executes against a fresh in-memory SQLite database per call.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    timeout: Duration,
}

impl SqliteGateway {
    /// SQLite VM instructions between deadline checks.
    const PROGRESS_OPS: i32 = 1_000;

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn execute(
        &self,
        setup: Option<&str>,
        query: &str,
        deadline: Instant,
    ) -> Result<ResultSet, sqlx::Error> {
        // Every `:memory:` connection is its own empty database.
        let mut conn = SqliteConnectOptions::from_str("sqlite::memory:")?
            .connect()
            .await?;

        // The engine interrupts the running statement once this returns false,
        // which stops the worker thread instead of leaving it spinning.
        conn.lock_handle()
            .await?
            .set_progress_handler(Self::PROGRESS_OPS, move || Instant::now() < deadline);

        if let Some(script) = setup.filter(|s| !s.trim().is_empty()) {
            conn.execute(sqlx::raw_sql(script)).await?;
        }

        let rows = conn.fetch_all(sqlx::query(query)).await?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;

        conn.close().await?;

        Ok(ResultSet::new(columns, decoded))
    }

    fn timed_out(&self) -> GatewayError {
        GatewayError::Execution(format!("Query timed out after {}s", self.timeout.as_secs()))
    }
}

#[async_trait]
impl SqlGateway for SqliteGateway {
    async fn run(&self, setup: Option<&str>, query: &str) -> Result<ResultSet, GatewayError> {
        let deadline = Instant::now() + self.timeout;
        // Backstop for time spent outside the engine, e.g. opening the connection.
        let backstop = self.timeout + Duration::from_secs(1);

        match tokio::time::timeout(backstop, self.execute(setup, query, deadline)).await {
            Ok(Ok(result)) => {
                tracing::debug!("Query returned {} rows", result.len());
                Ok(result)
            }
            Ok(Err(_)) if Instant::now() >= deadline => {
                tracing::debug!("Query interrupted after {:?}", self.timeout);
                Err(self.timed_out())
            }
            Ok(Err(e)) => {
                tracing::debug!("Query failed: {}", e);
                Err(GatewayError::Execution(diagnostic(&e)))
            }
            Err(_) => Err(self.timed_out()),
        }
    }
}

/// The engine's own message when there is one, not sqlx's wrapper text.
fn diagnostic(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db_err) => db_err.message().to_string(),
        None => err.to_string(),
    }
}

/// Later duplicates of a column name overwrite earlier ones.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = row.try_get_raw(index)?;
        let scalar = decode_value(column.type_info().name(), value).map_err(sqlx::Error::Decode)?;
        decoded.insert(column.name().to_string(), scalar);
    }
    Ok(decoded)
}

enum StorageClass {
    Integer,
    Real,
    Boolean,
    Blob,
    Text,
}

impl StorageClass {
    /// `declared` is the column's declared type, `stored` the value's own storage class.
    /// A declaration only refines numeric storage; anything else goes by what is stored.
    fn of(declared: &str, stored: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        match stored.to_ascii_uppercase().as_str() {
            "INTEGER" if declared.contains("BOOL") => StorageClass::Boolean,
            "INTEGER" if declared == "NUMERIC" => StorageClass::Real,
            "INTEGER" => StorageClass::Integer,
            "REAL" => StorageClass::Real,
            "BLOB" => StorageClass::Blob,
            _ => StorageClass::Text,
        }
    }
}

fn decode_value(declared: &str, value: SqliteValueRef<'_>) -> Result<Scalar, sqlx::error::BoxDynError> {
    if value.is_null() {
        return Ok(Scalar::Null);
    }

    let class = StorageClass::of(declared, value.type_info().name());
    let scalar = match class {
        StorageClass::Integer => Scalar::Integer(<i64 as Decode<Sqlite>>::decode(value)?),
        StorageClass::Real => Scalar::Real(<f64 as Decode<Sqlite>>::decode(value)?),
        StorageClass::Boolean => Scalar::Bool(<bool as Decode<Sqlite>>::decode(value)?),
        StorageClass::Blob => {
            let bytes = <Vec<u8> as Decode<Sqlite>>::decode(value)?;
            Scalar::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        StorageClass::Text => Scalar::Text(<String as Decode<Sqlite>>::decode(value)?),
    };
    Ok(scalar)
}

/// Delegates execution to an external service speaking the execute-sql wire format.
#[derive(Debug, Clone)]
pub struct RemoteGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteGateway {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SqlGateway for RemoteGateway {
    async fn run(&self, setup: Option<&str>, query: &str) -> Result<ResultSet, GatewayError> {
        let request = ExecuteSqlRequest {
            setup_sql: setup.map(str::to_string),
            user_query: query.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("SQL gateway unreachable: {}", e);
                GatewayError::Network(e.to_string())
            })?;

        // Status is informational only; the payload decides.
        let status = response.status();
        let payload: ExecuteSqlResponse = response.json().await.map_err(|e| {
            tracing::warn!("SQL gateway sent an unreadable payload ({}): {}", status, e);
            GatewayError::Network(format!("unreadable response ({}): {}", status, e))
        })?;

        if payload.success {
            Ok(payload.data.unwrap_or_default())
        } else {
            Err(GatewayError::Execution(
                payload
                    .error
                    .unwrap_or_else(|| "Query execution failed".to_string()),
            ))
        }
    }
}
