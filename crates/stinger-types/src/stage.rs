//! Pipeline stage selection and per-guardrail error policy.

use serde::{Deserialize, Serialize};

/// Which half of the pipeline a guardrail (or a call) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Input,
    Output,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// `enable_guardrail`/`disable_guardrail` accept `both` in addition to a
/// single stage; `PipelineStage` alone cannot express that, so the engine's
/// enable/disable entry points take this superset instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageSelector {
    Input,
    Output,
    Both,
}

impl StageSelector {
    pub fn matches(&self, stage: PipelineStage) -> bool {
        matches!(
            (self, stage),
            (StageSelector::Both, _)
                | (StageSelector::Input, PipelineStage::Input)
                | (StageSelector::Output, PipelineStage::Output)
        )
    }
}

/// Recovery policy applied when a guardrail's `analyze` call fails.
///
/// Modeled as a tagged variant rather than exceptions crossing the guardrail
/// boundary (see spec DESIGN NOTES on exception-based `on_error` policies).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    Block,
    Warn,
    #[default]
    Allow,
}
