//! The five audit event shapes (spec §4.6).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An append-only audit event. `event_type` is carried as the serde tag so
/// every record on disk is self-describing JSON-Lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditRecord {
    AuditTrailEnabled {
        timestamp: DateTime<Utc>,
        destination: String,
        redact_pii: bool,
        buffer_size: usize,
        flush_interval_secs: u64,
    },
    UserPrompt {
        timestamp: DateTime<Utc>,
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    LlmResponse {
        timestamp: DateTime<Utc>,
        response: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model_used: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        processing_time_ms: Option<u64>,
    },
    GuardrailDecision {
        timestamp: DateTime<Utc>,
        guardrail_name: String,
        /// One of `allow`, `block`, `warn`, `error`.
        decision: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        rule_triggered: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    Error {
        timestamp: DateTime<Utc>,
        message: String,
        #[serde(default)]
        context: BTreeMap<String, Value>,
    },
}

impl AuditRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::AuditTrailEnabled { timestamp, .. }
            | Self::UserPrompt { timestamp, .. }
            | Self::LlmResponse { timestamp, .. }
            | Self::GuardrailDecision { timestamp, .. }
            | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AuditTrailEnabled { .. } => "audit_trail_enabled",
            Self::UserPrompt { .. } => "user_prompt",
            Self::LlmResponse { .. } => "llm_response",
            Self::GuardrailDecision { .. } => "guardrail_decision",
            Self::Error { .. } => "error",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::UserPrompt { user_id, .. }
            | Self::LlmResponse { user_id, .. }
            | Self::GuardrailDecision { user_id, .. } => user_id.as_deref(),
            _ => None,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::UserPrompt { conversation_id, .. }
            | Self::LlmResponse { conversation_id, .. }
            | Self::GuardrailDecision { conversation_id, .. } => conversation_id.as_deref(),
            _ => None,
        }
    }

    /// Replace `prompt`/`response` content with the redaction in place.
    pub fn redact_with(&mut self, redact: impl Fn(&str) -> String) {
        match self {
            Self::UserPrompt { prompt, .. } => *prompt = redact(prompt),
            Self::LlmResponse { response, .. } => *response = redact(response),
            _ => {}
        }
    }
}
