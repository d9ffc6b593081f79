// src/main.rs

use dotenvy::dotenv;
use regex_sql_quiz::config::Config;
use regex_sql_quiz::routes;
use regex_sql_quiz::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().expect("Invalid configuration");

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Column policy: {}, scoring rule: {}, errored submissions count: {}",
        config.column_policy,
        config.scoring.rule,
        config.scoring.errored_consumes_attempt
    );

    // Load challenges and wire the SQL engine
    let state = AppState::new(config.clone()).expect("Failed to initialize application state");
    tracing::info!("Loaded {} challenge tiers", state.challenges.catalogue().len());

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
