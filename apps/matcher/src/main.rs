mod config;
mod errors;
mod features;
mod models;
mod routes;
mod scoring;
mod state;
mod text;
mod training;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::scoring::{InitOutcome, ModelService};
use crate::state::AppState;
use crate::text::Lexicon;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobLens matcher v{}", env!("CARGO_PKG_VERSION"));

    // One lexicon shared by the extractor, the trained model and the fallback matcher
    let lexicon = Lexicon::shared();
    info!("Skill lexicon loaded ({} terms)", lexicon.len());

    let service = Arc::new(ModelService::new(config.service_settings(), lexicon));

    // Load or train the model before accepting traffic (CPU-bound)
    let init = {
        let service = service.clone();
        tokio::task::spawn_blocking(move || service.initialize()).await?
    };
    match init {
        InitOutcome::Loaded => info!("Model loaded from {}", config.model_path.display()),
        InitOutcome::Trained(metrics) => info!(
            "Model trained (test R2 {:.3}, test RMSE {:.2})",
            metrics.test_r2, metrics.test_rmse
        ),
        InitOutcome::Fallback(reason) => info!("Serving with fallback matcher: {reason}"),
    }

    let state = AppState {
        config: config.clone(),
        service,
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
