//! `X-API-Key` authentication middleware (spec §6.4).
//!
//! Missing header → 401, unknown key → 403, auth enabled with zero
//! configured keys → 503 (a deployment that turned auth on but forgot to
//! load any keys fails closed rather than silently accepting everyone).

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::{hash_api_key, AppState};
use crate::types::ErrorResponse;

const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.auth_enabled {
        return next.run(request).await;
    }

    if state.api_key_hashes.is_empty() {
        return error(StatusCode::SERVICE_UNAVAILABLE, "no API keys configured");
    }

    let Some(presented) = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return error(StatusCode::UNAUTHORIZED, "missing X-API-Key header");
    };

    if !state.api_key_hashes.contains(&hash_api_key(presented)) {
        return error(StatusCode::FORBIDDEN, "unknown API key");
    }

    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}
