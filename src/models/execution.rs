// src/models/execution.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::result_set::ResultSet;

/// Request body of the SQL execution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExecuteSqlRequest {
    #[serde(rename = "setupSQL", default)]
    #[validate(length(max = 100000))]
    pub setup_sql: Option<String>,

    #[serde(rename = "userQuery", default)]
    #[validate(length(max = 10000))]
    pub user_query: String,
}

/// Response body of the SQL execution endpoint.
/// `success` is authoritative; the HTTP status is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteSqlResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteSqlResponse {
    pub fn ok(data: ResultSet) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
