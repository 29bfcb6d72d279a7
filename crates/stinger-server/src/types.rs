//! Wire DTOs for the four §6.4 endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pipeline_available: bool,
    pub guardrail_count: usize,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Prompt,
    Response,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: String,
    pub kind: CheckKind,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default)]
    pub context: Option<String>,
}

fn default_preset() -> String {
    "customer_service".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Warn,
    Block,
}

#[derive(Debug, Serialize)]
pub struct CheckMetadata {
    pub guardrails_triggered: Vec<String>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub action: Action,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: CheckMetadata,
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub preset: String,
    pub guardrails: RulesGuardrails,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RulesGuardrails {
    pub input_guardrails: serde_json::Value,
    pub output_guardrails: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default = "default_metrics_format")]
    pub format: String,
}

fn default_metrics_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, Default)]
pub struct RulesQuery {
    pub preset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
