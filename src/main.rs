mod app;
mod auth;
mod config;
mod db;
mod middleware;
mod otel;
mod state;
mod telemetry;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::AppConfig::from_env()?;
    let telemetry = otel::Telemetry::init(&config.otel)?;

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "auth_service=debug,axum=info,tower_http=info,sqlx=warn".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(tracing_opentelemetry::layer().with_tracer(telemetry.tracer()))
        .with(json_logs.then(|| fmt::layer().json().with_target(false)))
        .with((!json_logs).then(|| fmt::layer()))
        .try_init()?;

    if config.jwt.uses_default_secret() {
        tracing::warn!(env = ?config.env, "JWT_SECRET not set; using the development default");
    }
    tracing::info!(endpoint = %config.otel.collector_url(), "exporting telemetry over OTLP");

    let app_state = state::AppState::init(config).await?;
    let http = app_state.config.http.clone();

    let served = app::serve(app::build_app(app_state), &http).await;
    telemetry.shutdown();
    served
}
