use content_to_pdf::{AppState, api::routes::create_router, config::Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::load().inspect_err(|e| tracing::error!("{}", e))?;
    let server_addr = config.server_addr;
    tracing::info!(
        model = %config.openai_model,
        strip_mode = ?config.strip_mode,
        expose_error_details = config.expose_error_details,
        "configuration loaded"
    );

    // Create application state
    let app_state = AppState::from_config(config)?;

    // Build the router with routes
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    tracing::info!("Server running at http://{}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
