//! Shared "what do we do when this guardrail fires" knob used by the
//! built-in guardrails. Distinct from `stinger_types::OnError`, which only
//! governs what happens when `analyze` itself fails.

use serde::{Deserialize, Serialize};
use stinger_types::GuardrailResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionAction {
    #[default]
    Block,
    Warn,
}

impl DetectionAction {
    pub fn verdict(
        self,
        guardrail_name: &str,
        guardrail_type: &str,
        reason: impl Into<String>,
        confidence: f64,
        indicators: Vec<String>,
    ) -> GuardrailResult {
        let reason = reason.into();
        match self {
            DetectionAction::Block => {
                GuardrailResult::block(guardrail_name, guardrail_type, reason, confidence)
                    .with_indicators(indicators)
            }
            DetectionAction::Warn => {
                GuardrailResult::warn(guardrail_name, guardrail_type, reason, confidence)
                    .with_indicators(indicators)
            }
        }
    }
}
