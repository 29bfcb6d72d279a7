//! `GET /metrics?format=json|prometheus` (spec §6.4, §4.7): exposes the
//! `basic` preset pipeline's health snapshot in either representation.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;
use crate::types::{ErrorResponse, MetricsQuery};

const REPORTING_PRESET: &str = "basic";

pub async fn metrics(State(state): State<AppState>, Query(query): Query<MetricsQuery>) -> Response {
    let Some(pipeline) = state.pipelines.get(REPORTING_PRESET) else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "no pipeline available to report metrics for".to_string(),
            }),
        )
            .into_response();
    };

    let api_keys_status: BTreeMap<String, bool> = state
        .api_key_hashes
        .iter()
        .map(|hash| (hash[..8].to_string(), true))
        .collect();
    let health = pipeline.get_system_health(api_keys_status);

    match query.format.as_str() {
        "prometheus" => {
            let body = render_prometheus(&health);
            ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
        }
        "json" | "" => Json(health).into_response(),
        other => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unsupported metrics format '{other}'"),
            }),
        )
            .into_response(),
    }
}

fn render_prometheus(health: &stinger_engine::SystemHealth) -> String {
    let metrics = &health.performance_metrics;
    let overall = match health.overall_status {
        stinger_engine::OverallStatus::Healthy => 2,
        stinger_engine::OverallStatus::Degraded => 1,
        stinger_engine::OverallStatus::Unhealthy => 0,
    };
    let mut out = String::new();
    out.push_str("# HELP stinger_overall_status 0=unhealthy 1=degraded 2=healthy\n");
    out.push_str("# TYPE stinger_overall_status gauge\n");
    out.push_str(&format!("stinger_overall_status {overall}\n"));
    out.push_str("# HELP stinger_requests_total Total checks processed.\n");
    out.push_str("# TYPE stinger_requests_total counter\n");
    out.push_str(&format!("stinger_requests_total {}\n", metrics.total_requests));
    out.push_str("# HELP stinger_requests_blocked_total Checks that resulted in a block.\n");
    out.push_str("# TYPE stinger_requests_blocked_total counter\n");
    out.push_str(&format!(
        "stinger_requests_blocked_total {}\n",
        metrics.blocked_requests
    ));
    out.push_str("# HELP stinger_avg_response_time_ms Running mean processing time.\n");
    out.push_str("# TYPE stinger_avg_response_time_ms gauge\n");
    out.push_str(&format!(
        "stinger_avg_response_time_ms {}\n",
        metrics.avg_response_time_ms
    ));
    out.push_str("# HELP stinger_peak_response_time_ms Peak observed processing time.\n");
    out.push_str("# TYPE stinger_peak_response_time_ms gauge\n");
    out.push_str(&format!(
        "stinger_peak_response_time_ms {}\n",
        metrics.peak_response_time_ms
    ));
    out.push_str("# HELP stinger_guardrails_enabled Guardrails currently enabled.\n");
    out.push_str("# TYPE stinger_guardrails_enabled gauge\n");
    out.push_str(&format!(
        "stinger_guardrails_enabled {}\n",
        health.pipeline_status.total_enabled
    ));
    out
}
