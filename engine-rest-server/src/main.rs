//! engine-rest - REST facade over the in-memory process engine.
//!
//! Configuration is read from env vars (and `.env` when present); see
//! `engine_rest_server::config` for the full list.

use std::sync::Arc;

use engine_rest_core::engine::{MemoryEngine, ProcessEngine};
use engine_rest_server::config::ServerConfig;
use engine_rest_server::router::build_router;
use engine_rest_server::state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,engine_rest_server=debug,engine_rest_core=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Data formats: {}",
        config.data_formats.formats().collect::<Vec<_>>().join(", ")
    );

    let engine: Arc<dyn ProcessEngine> = Arc::new(MemoryEngine::new());
    let state = AppState::new(engine, config.data_formats.clone());
    let app = build_router(state, &config);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        "engine-rest listening on {}{}",
        config.bind_addr,
        config.base_path
    );

    axum::serve(listener, app).await?;
    Ok(())
}
