//! Runnable entry point for the HTTP adapter. Reads `STINGER_API_KEYS`
//! (comma-separated) and `STINGER_BIND_ADDR` from the environment; auth is
//! enabled whenever `STINGER_API_KEYS` is set, even to an empty value (the
//! operator opted in but misconfigured it, which should fail closed with
//! 503 rather than silently disable auth).

use std::net::SocketAddr;

use stinger_server::state::{AppState, PresetPipelines};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let pipelines = PresetPipelines::build()?;

    let state = match std::env::var("STINGER_API_KEYS") {
        Ok(raw) => {
            let keys: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            AppState::new(pipelines, keys, true)
        }
        Err(_) => AppState::without_auth(pipelines),
    };

    let addr: SocketAddr = std::env::var("STINGER_BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()?;

    let router = stinger_server::build_router(state);
    tracing::info!(%addr, "starting stinger-server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
