use anyhow::Context;
use jobbot::api;
use jobbot::bootstrap::bootstrap;
use jobbot::config::ConfigLoader;
use jobbot::observability::init_tracing;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging);

    info!("Starting {}...", config.app_name);

    let app_state = match bootstrap(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    info!(
        rows = app_state.dataset.len(),
        model = %app_state.model_name,
        "Application state created"
    );

    let router = api::create_router(app_state, &config.server.cors_origins);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
