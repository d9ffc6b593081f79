// tests/gateway_tests.rs

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::post,
};
use regex_sql_quiz::{
    checker::gateway::{GatewayError, RemoteGateway, SqlGateway, SqliteGateway},
    config::Config,
    models::{
        challenge::ChallengeBank,
        execution::{ExecuteSqlRequest, ExecuteSqlResponse},
        result_set::Scalar,
    },
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

/// Stand-in for an external execution service.
async fn stub_execute(Json(req): Json<ExecuteSqlRequest>) -> impl IntoResponse {
    if req.user_query.contains("fail") {
        return (StatusCode::OK, Json(json!({ "success": false, "error": "boom" })));
    }
    if req.user_query.contains("flaky") {
        // Transport status disagrees with the payload; the payload wins.
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": true, "data": [{ "n": 2 }] })),
        );
    }
    if req.user_query.contains("garbage") {
        return (StatusCode::OK, Json(json!({ "unexpected": true })));
    }
    let setup_seen = req.setup_sql.is_some();
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": [{ "n": 1, "setup": setup_seen }] })),
    )
}

async fn spawn_stub() -> Url {
    let app = Router::new().route("/execute", post(stub_execute));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://127.0.0.1:{}/execute", port)).unwrap()
}

fn remote(url: Url) -> RemoteGateway {
    RemoteGateway::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn remote_gateway_decodes_rows() {
    let gateway = remote(spawn_stub().await);
    let result = gateway.run(Some("CREATE TABLE t (n INT)"), "SELECT n FROM t").await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows()[0]["n"], Scalar::Integer(1));
    assert_eq!(result.rows()[0]["setup"], Scalar::Bool(true));
}

#[tokio::test]
async fn remote_gateway_trusts_the_success_flag() {
    let gateway = remote(spawn_stub().await);

    let err = gateway.run(None, "SELECT fail").await.unwrap_err();
    assert_eq!(err, GatewayError::Execution("boom".to_string()));

    let rows = gateway.run(None, "SELECT flaky").await.unwrap();
    assert_eq!(rows.rows()[0]["n"], Scalar::Integer(2));
}

#[tokio::test]
async fn remote_gateway_reports_network_errors() {
    let gateway = remote(spawn_stub().await);
    let err = gateway.run(None, "SELECT garbage").await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));

    // Grab a free port, then close it again.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let unreachable = remote(Url::parse(&format!("http://127.0.0.1:{}/execute", port)).unwrap());
    let err = unreachable.run(None, "SELECT 1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));
}

#[tokio::test]
async fn execute_sql_endpoint_can_chain_to_a_remote_service() {
    let config = Config {
        sql_gateway_url: Some(spawn_stub().await),
        ..Config::default()
    };
    let app = routes::create_router(AppState::new(config).unwrap());

    let request = Request::builder()
        .method("POST")
        .uri("/api/execute-sql")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "userQuery": "SELECT fail" })).unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: ExecuteSqlResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, ExecuteSqlResponse::failed("boom"));
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = routes::create_router(AppState::new(Config::default()).unwrap());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/random_path_that_does_not_exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn broken_reference_query_is_an_internal_error() {
    let bank = ChallengeBank::from_json(
        r#"{ "sql": { "easy": [ {
            "id": 99,
            "question": "Select everything",
            "description": "Select all users",
            "testString": "users table: id, name",
            "correctAnswer": "SELECT * FROM userz",
            "setupSQL": "CREATE TABLE users (id INTEGER, name TEXT); INSERT INTO users VALUES (1, 'A');"
        } ] } }"#,
    )
    .unwrap();
    let state = AppState::with_gateway(
        Config::default(),
        bank,
        Arc::new(SqliteGateway::new(Duration::from_secs(5))),
    );
    let app = routes::create_router(state);

    let create = Request::builder()
        .method("POST")
        .uri("/api/sessions")
        .header("content-type", "application/json")
        .body(Body::from(r#"{ "quizType": "sql", "difficulty": "easy" }"#))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let session: Value = serde_json::from_slice(&bytes).unwrap();
    let id = session["id"].as_str().unwrap();

    let submit = Request::builder()
        .method("POST")
        .uri(format!("/api/sessions/{}/answer", id))
        .header("content-type", "application/json")
        .body(Body::from(r#"{ "answer": "SELECT * FROM users" }"#))
        .unwrap();
    let response = app.oneshot(submit).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let verdict: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(verdict["verdict"], "errored");
    assert_eq!(verdict["kind"], "reference_execution");
    assert_eq!(
        verdict["feedback"],
        "Internal error: Could not execute expected query"
    );
    assert_eq!(verdict["score"], 0);
}
