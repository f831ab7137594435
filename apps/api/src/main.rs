mod applications;
mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod notify;
mod reports;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::store::PgApplicationStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::interview::ai::LlmInterviewAi;
use crate::interview::controller::InterviewController;
use crate::interview::session::ProctorPolicy;
use crate::llm_client::LlmClient;
use crate::notify::SendGridNotifier;
use crate::reports::S3ReportStore;
use crate::routes::build_router;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let applications = Arc::new(PgApplicationStore::new(db));

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let reports = Arc::new(S3ReportStore::new(s3, config.s3_bucket.clone()));
    info!("Report store ready (bucket: {})", config.s3_bucket);

    let call_timeout = Duration::from_secs(config.ai_timeout_secs);
    let llm = LlmClient::new(config.anthropic_api_key.clone(), call_timeout)?;
    let ai = Arc::new(LlmInterviewAi::new(llm));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let notifier = Arc::new(SendGridNotifier::new(
        reqwest::Client::new(),
        config.sendgrid_api_key.clone(),
        config.mail_default_sender.clone(),
    ));

    let policy = ProctorPolicy::from_config(&config);
    info!(
        "Proctoring: terminate after {} tab switches, debounce {}ms",
        policy.max_tab_switches,
        policy.debounce.num_milliseconds()
    );

    let interviews = Arc::new(
        InterviewController::new(
            applications.clone(),
            ai.clone(),
            reports.clone(),
            policy,
            call_timeout,
        )
        .with_max_session_age(chrono::Duration::seconds(config.session_max_age_secs)),
    );
    interviews.spawn_sweeper(SESSION_SWEEP_INTERVAL);

    let state = AppState {
        interviews,
        applications,
        ai,
        reports,
        notifier,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds an S3 client against MinIO locally or AWS in production.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "interview-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
