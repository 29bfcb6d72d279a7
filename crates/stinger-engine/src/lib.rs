//! Public library facade for Stinger: the pipeline engine (§4.5), health
//! monitor (§4.7), presets (§6.1), and a minimal YAML config loader.
//!
//! Mirrors the role the teacher's top-level `lr-server`/`lr-router` crates
//! play as the assembly point over their leaf crates: everything a caller
//! needs — `create_pipeline`, `Pipeline`, the conversation/audit/rate-limit
//! re-exports — is reachable from here without digging into the other
//! `stinger-*` crates directly.

pub mod config;
pub mod health;
pub mod pipeline;
pub mod presets;

pub use health::{HealthMonitor, OverallStatus, PerformanceMetrics, SystemHealth};
pub use pipeline::{GuardrailStatus, GuardrailStatusEntry, Pipeline};

// Re-exports so a caller depending only on `stinger-engine` has the full
// public surface named in spec.md §6.1 without adding the leaf crates as
// direct dependencies.
pub use stinger_audit as audit;
pub use stinger_conversation::{Conversation, ConversationBuilder, RateLimitAction, Turn};
pub use stinger_guardrails::{get_global_registry, Guardrail, GuardrailRegistry};
pub use stinger_ratelimit::{get_global_rate_limiter, GlobalRateLimiter};
pub use stinger_types::{
    GuardrailConfig, GuardrailError, GuardrailResult, OnError, PipelineConfig, PipelineResult,
    PipelineStage, StageSelector, StingerError, StingerResult,
};

impl Pipeline {
    /// Builds a pipeline from one of the six bundled presets (spec §6.1).
    pub fn from_preset(name: &str) -> StingerResult<Self> {
        let config = presets::load(name)?;
        Ok(Pipeline::from_config(&config, get_global_registry()))
    }

    /// Builds a pipeline from a config value (already parsed from YAML or
    /// constructed in memory), mirroring `Pipeline(config_path_or_dict)` in
    /// spec §6.1.
    pub fn from_config_value(config: PipelineConfig) -> Self {
        Pipeline::from_config(&config, get_global_registry())
    }

    /// Builds a pipeline from a YAML config file on disk.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> StingerResult<Self> {
        let parsed = config::load_file(path)?;
        Ok(Pipeline::from_config(&parsed, get_global_registry()))
    }
}

/// `create_pipeline() → Pipeline` with a default configuration (spec
/// §6.1). Resolved choice of default: the `basic` preset (PII blocking on
/// both stages) — a caller reaching for this entry point wants a working
/// pipeline without first deciding on a domain-specific preset, and
/// `basic` is the smallest preset that still exercises fusion (DESIGN.md).
pub fn create_pipeline() -> Pipeline {
    Pipeline::from_preset("basic").expect("the 'basic' preset always parses")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_pipeline_blocks_pii() {
        let pipeline = create_pipeline();
        let result = pipeline
            .check_input_async("my email is a@b.com", None, None)
            .await;
        assert!(result.blocked);
    }

    #[tokio::test]
    async fn from_preset_rejects_unknown_name() {
        let err = Pipeline::from_preset("nonexistent").unwrap_err();
        assert!(matches!(err, StingerError::InvalidInput(_)));
    }
}
