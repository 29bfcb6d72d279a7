//! Thin axum HTTP adapter over the Stinger pipeline engine (spec §6.4).
//!
//! Mirrors the teacher's `lr-server` crate: a `state` module owning shared,
//! `Clone`-cheap application state, a `routes` module of handler functions,
//! and a `build_router` assembly point that wires middleware (auth, CORS,
//! body-size limits, tracing) around them.

pub mod auth;
pub mod routes;
pub mod state;
pub mod types;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use state::{AppState, DEFAULT_MAX_BODY_BYTES};

/// Assembles the full router. `/health` stays outside the auth layer — a
/// load balancer needs to reach it even when `X-API-Key` checking is on;
/// the other three endpoints go through `require_api_key`.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/check", axum::routing::post(routes::check::check))
        .route("/v1/rules", get(routes::rules::rules))
        .route("/metrics", get(routes::metrics::metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(DEFAULT_MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
