use movie_catalog::{
    api::{build_router, AppState},
    bootstrap::open_catalog,
    config::Config,
    telemetry::init_tracing,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    init_tracing(&config.observability);

    tracing::info!("Starting movie catalog v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if let Err(e) = movie_catalog::metrics::init_metrics() {
        tracing::warn!("Failed to initialize metrics: {}", e);
        tracing::warn!("Continuing without metrics");
    }

    // Initialize store, index and coordinator
    let catalog = open_catalog(&config).await?;
    tracing::info!("Record store and search index ready");

    let app_state = AppState::new(catalog)
        .with_search_page_size(config.search.default_page_size)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));

    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Movies API: http://{}/api/movies", http_addr);

    axum::serve(http_listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
