//! Main entry point for the Virtual Atelier service

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use virtual_atelier::{api, backend::GeminiBackend, config::Settings, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    if settings.logging.format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    }

    settings.validate()?;

    info!(
        server = %format!("{}:{}", settings.server.host, settings.server.port),
        model = %settings.generation.model,
        jobs = settings.jobs.len(),
        "Starting Virtual Atelier"
    );

    if settings.generation.credential().is_none() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail");
    }

    let backend = Arc::new(GeminiBackend::new(&settings.generation)?);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app_state = Arc::new(AppState::new(settings, backend));

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
