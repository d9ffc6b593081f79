// src/handlers/sql.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    checker::AnswerChecker,
    error::AppError,
    models::execution::{ExecuteSqlRequest, ExecuteSqlResponse},
};

/// Runs one query against a fresh database built from `setupSQL`.
///
/// Execution failures are reported with HTTP 200 and `success: false`;
/// only a missing query is a 400.
pub async fn execute_sql(
    State(checker): State<AnswerChecker>,
    Json(req): Json<ExecuteSqlRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    if req.user_query.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ExecuteSqlResponse::failed("Query is required")),
        ));
    }

    let response = match checker
        .gateway()
        .run(req.setup_sql.as_deref(), &req.user_query)
        .await
    {
        Ok(rows) => ExecuteSqlResponse::ok(rows),
        Err(e) => ExecuteSqlResponse::failed(e.to_string()),
    };

    Ok((StatusCode::OK, Json(response)))
}
