mod api;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use api::server::create_router;
use api::AppState;
use config::AppConfig;
use services::{ModelGateway, OpenAIService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the logger reads RUST_LOG
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting NutriTracker AI service...");

    let config = AppConfig::from_env();

    let gateway = Arc::new(OpenAIService::new(&config)?) as Arc<dyn ModelGateway>;
    log::info!(
        "✅ Model gateway initialized ({}) - chat: {}, vision: {}, plans: {}",
        config.base_url,
        config.models.chat,
        config.models.vision,
        config.models.plan
    );

    let state = Arc::new(AppState::new(gateway, &config));
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("🌐 HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
    log::info!("🛑 Shutting down...");
}
