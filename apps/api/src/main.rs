mod config;
mod errors;
mod llm_client;
mod orchestration;
mod routes;
mod side_effects;
mod state;
mod tools;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::orchestration::LlmReasoner;
use crate::routes::build_router;
use crate::side_effects::mail::SmtpMailer;
use crate::side_effects::meetings::ZoomClient;
use crate::state::AppState;
use crate::workflow::case::load_job_description;
use crate::workflow::WorkflowController;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview scheduler v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let mailer = SmtpMailer::from_config(&config)?;
    info!(host = %config.smtp_host, port = config.smtp_port, "SMTP transport initialized");

    let meetings = ZoomClient::from_config(&config)?;
    info!(api_base = %config.zoom_api_base, "Meeting client initialized");

    let job_description = load_job_description(config.job_description_path.as_deref())?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let workflow = WorkflowController::new(
        Arc::new(LlmReasoner::new(llm)),
        Arc::new(mailer),
        Arc::new(meetings),
        config.reviewer_email.clone(),
        config.max_rounds,
        config.actor_timeout,
    );
    info!(
        max_rounds = config.max_rounds,
        actor_timeout_secs = config.actor_timeout.as_secs(),
        "Workflow controller ready"
    );

    let state = AppState {
        config: config.clone(),
        job_description: Arc::from(job_description),
        workflow: Arc::new(workflow),
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
