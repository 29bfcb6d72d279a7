//! `GET /health` (spec §6.4). Unauthenticated: a load balancer needs to
//! reach this even when `X-API-Key` checking is on.

use axum::extract::State;
use axum::Json;

use crate::state::AppState;
use crate::types::HealthResponse;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state
        .pipelines
        .get("basic")
        .map(|p| p.get_guardrail_status())
        .unwrap_or(stinger_engine::GuardrailStatus {
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
            total_enabled: 0,
            total: 0,
        });

    Json(HealthResponse {
        status: if status.total > 0 || state.pipelines.names().count() > 0 {
            "ok"
        } else {
            "degraded"
        },
        pipeline_available: state.pipelines.names().count() > 0,
        guardrail_count: status.total,
        api_key_configured: !state.api_key_hashes.is_empty(),
    })
}
