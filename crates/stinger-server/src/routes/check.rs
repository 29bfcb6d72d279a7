//! `POST /v1/check` (spec §6.4): runs one input/output check through the
//! requested preset's pipeline, gated by the global rate limiter.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use stinger_ratelimit::get_global_rate_limiter;

use crate::state::{AppState, MAX_CONTEXT_BYTES, MAX_PRESET_CHARS, MAX_TEXT_BYTES};
use crate::types::{Action, CheckKind, CheckMetadata, CheckRequest, CheckResponse, ErrorResponse};

const RATE_LIMIT_WINDOW: &str = "requests_per_minute";

pub async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CheckRequest>,
) -> Response {
    if let Err(response) = validate(&request) {
        return response;
    }

    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    let limiter = get_global_rate_limiter();
    let verdict = limiter.check_rate_limit(&key, None);
    if verdict.exceeded {
        return rate_limited(&verdict, &limiter.get_status(&key).details);
    }

    let Some(pipeline) = state.pipelines.get(&request.preset) else {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("unknown preset '{}'", request.preset),
        );
    };

    let result = match request.kind {
        CheckKind::Prompt => pipeline.check_input_async(&request.text, None, Some(&key)).await,
        CheckKind::Response => pipeline.check_output_async(&request.text, None, Some(&key)).await,
    };

    limiter.record_request(&key);

    let action = match result.action() {
        "block" => Action::Block,
        "warn" => Action::Warn,
        _ => Action::Allow,
    };

    let body = CheckResponse {
        action,
        reasons: result.reasons,
        warnings: result.warnings,
        metadata: CheckMetadata {
            guardrails_triggered: result
                .details
                .iter()
                .filter(|(_, r)| r.blocked || r.warned)
                .map(|(name, _)| name.clone())
                .collect(),
            processing_time_ms: result.processing_time_ms,
        },
    };

    let mut response = Json(body).into_response();
    attach_rate_limit_headers(response.headers_mut(), &limiter.get_status(&key).details);
    response
}

fn validate(request: &CheckRequest) -> Result<(), Response> {
    if request.text.len() > MAX_TEXT_BYTES {
        return Err(error(StatusCode::PAYLOAD_TOO_LARGE, "text exceeds maximum size"));
    }
    if let Some(context) = &request.context {
        if context.len() > MAX_CONTEXT_BYTES {
            return Err(error(StatusCode::PAYLOAD_TOO_LARGE, "context exceeds maximum size"));
        }
    }
    if request.preset.len() > MAX_PRESET_CHARS {
        return Err(error(StatusCode::BAD_REQUEST, "preset name too long"));
    }
    Ok(())
}

fn rate_limited(
    verdict: &stinger_ratelimit::CheckResult,
    windows: &std::collections::BTreeMap<String, stinger_ratelimit::WindowStatus>,
) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse {
            error: verdict
                .reason
                .clone()
                .unwrap_or_else(|| "rate limit exceeded".to_string()),
        }),
    )
        .into_response();
    attach_rate_limit_headers(response.headers_mut(), windows);
    if let Ok(header) = HeaderValue::from_str("60") {
        response.headers_mut().insert("retry-after", header);
    }
    response
}

fn attach_rate_limit_headers(
    headers: &mut HeaderMap,
    windows: &std::collections::BTreeMap<String, stinger_ratelimit::WindowStatus>,
) {
    let Some(minute) = windows.get(RATE_LIMIT_WINDOW) else {
        return;
    };
    if let Ok(v) = HeaderValue::from_str(&minute.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&minute.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Some(reset) = minute.reset_time {
        if let Ok(v) = HeaderValue::from_str(&reset.timestamp().to_string()) {
            headers.insert("x-ratelimit-reset", v);
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}
