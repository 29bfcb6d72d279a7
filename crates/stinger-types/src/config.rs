//! Wire format for pipeline configuration (spec §6.2).
//!
//! The factory (`stinger-guardrails::registry`) deserializes each entry into
//! [`GuardrailConfig`], whose nested detector options live exclusively under
//! `.config` — enforcing the config-nesting invariant (spec §8 property 7)
//! by construction rather than by convention.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stage::OnError;

/// One guardrail entry within a pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub guardrail_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub on_error: OnError,
    /// Detector-specific options. Only the guardrail constructor for
    /// `guardrail_type` interprets this; the factory and pipeline never look
    /// inside it.
    #[serde(default = "default_config_value")]
    pub config: Value,
}

fn default_enabled() -> bool {
    true
}

fn default_config_value() -> Value {
    Value::Object(serde_json::Map::new())
}

/// The two stage lists a pipeline is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default)]
    pub input: Vec<GuardrailConfig>,
    #[serde(default)]
    pub output: Vec<GuardrailConfig>,
}

/// Top-level pipeline configuration (spec §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub version: String,
    #[serde(default)]
    pub pipeline: StagesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            pipeline: StagesConfig::default(),
        }
    }
}
