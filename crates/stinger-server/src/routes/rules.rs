//! `GET /v1/rules?preset=...` (spec §6.4): exposes the active guardrail
//! configuration for a preset without leaking registry internals.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

use crate::state::AppState;
use crate::types::{ErrorResponse, RulesGuardrails, RulesQuery, RulesResponse};

const DEFAULT_PRESET: &str = "customer_service";

pub async fn rules(State(state): State<AppState>, Query(query): Query<RulesQuery>) -> Response {
    let preset = query.preset.unwrap_or_else(|| DEFAULT_PRESET.to_string());

    let Some(pipeline) = state.pipelines.get(&preset) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown preset '{preset}'"),
            }),
        )
            .into_response();
    };

    let status = pipeline.get_guardrail_status();
    let input_guardrails = serde_json::to_value(&status.input_guardrails).unwrap_or_default();
    let output_guardrails = serde_json::to_value(&status.output_guardrails).unwrap_or_default();

    // Stable version string: "1.0.<8-hex-digest>" of the serialized ruleset,
    // so a caller can cheaply detect whether a preset's rules changed
    // between two polls without diffing the full body.
    let mut hasher = Sha256::new();
    hasher.update(input_guardrails.to_string().as_bytes());
    hasher.update(output_guardrails.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    let version = format!("1.0.{}", &digest[..8]);

    Json(RulesResponse {
        preset,
        guardrails: RulesGuardrails {
            input_guardrails,
            output_guardrails,
        },
        version,
    })
    .into_response()
}
