//! The data produced by a single guardrail evaluation and by a full
//! pipeline call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stage::PipelineStage;

/// Outcome of one guardrail's `analyze` call.
///
/// Invariant: `blocked` and `warned` are never both `true`. If a detector
/// reports neither, the result is an allow. Build one through
/// [`GuardrailResult::allow`], [`GuardrailResult::warn`], [`GuardrailResult::block`]
/// or [`GuardrailResult::error`] rather than constructing the struct literal
/// directly, so the invariant can't be violated by accident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub blocked: bool,
    pub warned: bool,
    pub reason: String,
    pub confidence: f64,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    #[serde(default)]
    pub indicators: Vec<String>,
    pub guardrail_name: String,
    pub guardrail_type: String,
    /// Not part of the spec's wire contract, but every result the pipeline
    /// synthesizes for a recovered error stamps `decision = "error"` here so
    /// callers inspecting `details` can distinguish a real allow from a
    /// swallowed failure (see SPEC_FULL.md §3, resolved Open Question 1).
    #[serde(default)]
    pub decision: Option<String>,
}

impl GuardrailResult {
    pub fn allow(guardrail_name: impl Into<String>, guardrail_type: impl Into<String>) -> Self {
        Self {
            blocked: false,
            warned: false,
            reason: String::new(),
            confidence: 0.0,
            details: BTreeMap::new(),
            indicators: Vec::new(),
            guardrail_name: guardrail_name.into(),
            guardrail_type: guardrail_type.into(),
            decision: Some("allow".to_string()),
        }
    }

    pub fn warn(
        guardrail_name: impl Into<String>,
        guardrail_type: impl Into<String>,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            blocked: false,
            warned: true,
            reason: reason.into(),
            confidence,
            details: BTreeMap::new(),
            indicators: Vec::new(),
            guardrail_name: guardrail_name.into(),
            guardrail_type: guardrail_type.into(),
            decision: Some("warn".to_string()),
        }
    }

    pub fn block(
        guardrail_name: impl Into<String>,
        guardrail_type: impl Into<String>,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            blocked: true,
            warned: false,
            reason: reason.into(),
            confidence,
            details: BTreeMap::new(),
            indicators: Vec::new(),
            guardrail_name: guardrail_name.into(),
            guardrail_type: guardrail_type.into(),
            decision: Some("block".to_string()),
        }
    }

    /// Synthesized result for a recovered `analyze` failure; `blocked`/`warned`
    /// are derived from the guardrail's `on_error` policy by the caller.
    pub fn error(
        guardrail_name: impl Into<String>,
        guardrail_type: impl Into<String>,
        message: impl std::fmt::Display,
        blocked: bool,
        warned: bool,
    ) -> Self {
        let reason = if blocked || warned {
            format!("filter error: {message}")
        } else {
            String::new()
        };
        Self {
            blocked,
            warned,
            reason,
            confidence: 0.0,
            details: BTreeMap::new(),
            indicators: Vec::new(),
            guardrail_name: guardrail_name.into(),
            guardrail_type: guardrail_type.into(),
            decision: Some("error".to_string()),
        }
    }

    pub fn with_details(mut self, details: BTreeMap<String, Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_indicators(mut self, indicators: Vec<String>) -> Self {
        self.indicators = indicators;
        self
    }

    /// `true` if neither `blocked` nor `warned` is set.
    pub fn is_allow(&self) -> bool {
        !self.blocked && !self.warned
    }
}

/// Outcome of a full `check_input`/`check_output` pipeline call.
///
/// Invariant: `details` contains exactly one entry per enabled guardrail
/// attempted in the selected stage (spec §8 property 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub blocked: bool,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub details: BTreeMap<String, GuardrailResult>,
    pub pipeline_type: PipelineStage,
    pub conversation_id: Option<String>,
    pub processing_time_ms: u64,
}

impl PipelineResult {
    /// `warn` iff there are warnings and the call wasn't blocked, matching
    /// the HTTP adapter's `action` derivation (spec §6.4).
    pub fn action(&self) -> &'static str {
        if self.blocked {
            "block"
        } else if !self.warnings.is_empty() {
            "warn"
        } else {
            "allow"
        }
    }
}
