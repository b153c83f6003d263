// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use meter_billing::application::reading_service::ReadingService;
use meter_billing::infrastructure::config::load_app_config;
use meter_billing::infrastructure::rest_repository::RestRepository;
use meter_billing::presentation::app_state::AppState;
use meter_billing::presentation::handlers::{
    approve_reading, health_check, list_meters, property_bill, reject_reading, save_readings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meter_billing=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(RestRepository::new(
        config.backend.url,
        config.backend.api_key,
        config.backend.meters_table,
        config.backend.apartments_table,
    ));

    // Create services (application layer)
    let reading_service = ReadingService::new(repository, config.billing);

    let state = Arc::new(AppState { reading_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/properties/:id/meters", get(list_meters))
        .route("/properties/:id/bill", get(property_bill))
        .route("/properties/:id/readings", post(save_readings))
        .route("/properties/:id/meters/:meter_id/approve", post(approve_reading))
        .route("/properties/:id/meters/:meter_id/reject", post(reject_reading))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting meter-billing service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
