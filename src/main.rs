use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use eleventools_server::session::cleanup::spawn_cleanup_task;
use eleventools_server::{config, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load config
    let config = config::Config::from_env();
    let port = config.port;
    if config.elevenlabs_api_key.is_empty() {
        tracing::warn!("ELEVENLABS_API_KEY not set; users must enter a key in Settings");
    }

    let state = AppState::new(config.clone());

    // Outputs root
    tokio::fs::create_dir_all(state.outputs.path())
        .await
        .with_context(|| format!("creating outputs directory {}", state.outputs.path().display()))?;
    tracing::info!("Writing audio under {}", state.outputs.path().display());

    // Session sweep
    let shutdown = spawn_cleanup_task(
        state.outputs.clone(),
        state.sessions.clone(),
        config.session_max_age(),
        config.cleanup_interval(),
    );

    let app = routes::create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    shutdown.send(true).ok();
    Ok(())
}
