mod acquisition;
mod config;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::acquisition::browser::HeadlessPageSource;
use crate::acquisition::jd_converter::LlmJobStructurer;
use crate::acquisition::page_fetcher::{HttpPageSource, JobPageFetcher};
use crate::acquisition::profile::{BrightDataProvider, ProfileLookup};
use crate::acquisition::resume_parser::PdfResumeParser;
use crate::config::Config;
use crate::generation::synthesizer::LlmSynthesizer;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (shared by the JD converter and the synthesizer)
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Job page fetcher: plain HTTP first, headless Chromium as fallback
    let fetcher = JobPageFetcher::new(
        Arc::new(HttpPageSource::new(&config.fetch)?),
        Arc::new(HeadlessPageSource::new(config.browser.clone())),
    );

    // Profile lookup is optional; without a key every search is empty
    let profiles = match &config.bright_data_api_key {
        Some(key) => {
            let provider =
                BrightDataProvider::new(key.clone(), config.bright_data_dataset_id.clone())?;
            info!(
                "Profile lookup enabled (dataset: {})",
                config.bright_data_dataset_id
            );
            ProfileLookup::new(Arc::new(provider))
        }
        None => {
            warn!("BRIGHT_DATA_API_KEY not set, profile lookup disabled");
            ProfileLookup::disabled()
        }
    };

    match config.generation_deadline {
        Some(deadline) => info!("Per-worker generation deadline: {deadline:?}"),
        None => info!("Per-worker generation deadline disabled"),
    }

    // Build app state
    let state = AppState::new(
        Arc::new(fetcher),
        Arc::new(LlmJobStructurer::new(llm.clone())),
        Arc::new(profiles),
        Arc::new(PdfResumeParser),
        Arc::new(LlmSynthesizer::new(llm)),
        config.generation_deadline,
    )
    .with_upload_limit(config.max_upload_bytes);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
