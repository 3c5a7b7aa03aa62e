mod analysis;
mod cleaner;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;
use crate::extraction::ocr::TesseractOcr;
use crate::extraction::pdf::PdftoppmRasterizer;
use crate::extraction::DocumentExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails here, not on the first request, when GROQ_API_KEY is missing
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cv-api v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.groq_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let ocr = TesseractOcr::new(
        config.tesseract_path.clone(),
        config.ocr_language.clone(),
        config.ocr_scratch_dir.clone(),
    );
    let rasterizer =
        PdftoppmRasterizer::new(config.pdftoppm_path.clone(), config.ocr_scratch_dir.clone());
    info!(
        tesseract = %config.tesseract_path,
        pdftoppm = %config.pdftoppm_path,
        language = %config.ocr_language,
        "OCR toolchain configured"
    );

    let state = AppState {
        config: config.clone(),
        extractor: Arc::new(DocumentExtractor::new(Arc::new(ocr), Arc::new(rasterizer))),
        analyzer: Arc::new(ResumeAnalyzer::new(Arc::new(llm))),
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
