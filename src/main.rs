use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use stepflow_backend::core::config::{AppPaths, ConfigService};
use stepflow_backend::core::logging;
use stepflow_backend::server;
use stepflow_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    let config_service = ConfigService::new(&paths);
    let config = config_service
        .load_config()
        .context("Failed to load configuration")?;
    logging::init(&paths, &config.logging);
    tracing::info!("Configuration: {}", config_service.config_path().display());

    let mut server_config = config.server.clone();
    if let Some(port) = env::var("PORT").ok().and_then(|val| val.parse::<u16>().ok()) {
        server_config.port = port;
    }
    let bind_addr = server_config.bind_addr();

    let state = AppState::from_config(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("STEPFLOW_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
