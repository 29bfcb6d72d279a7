//! The pipeline engine: construction, enable/disable, and the
//! `check_input`/`check_output` evaluation contract (spec §4.5).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use stinger_audit::AuditTrail;
use stinger_conversation::Conversation;
use stinger_guardrails::{Guardrail, GuardrailRegistry};
use stinger_types::{
    GuardrailConfig, GuardrailResult, OnError, PipelineConfig, PipelineResult, PipelineStage,
    StageSelector,
};

use crate::health::HealthMonitor;

/// One guardrail wired into a stage, plus its independently-toggleable
/// enabled flag (spec §4.5 enable/disable contract: the same `name` can be
/// enabled on one stage and disabled on the other).
#[derive(Clone)]
struct GuardrailEntry {
    name: String,
    on_error: OnError,
    enabled: bool,
    guardrail: Arc<dyn Guardrail>,
}

#[derive(Clone, Default)]
struct Stages {
    input: Vec<GuardrailEntry>,
    output: Vec<GuardrailEntry>,
}

impl Stages {
    fn entries(&self, stage: PipelineStage) -> &[GuardrailEntry] {
        match stage {
            PipelineStage::Input => &self.input,
            PipelineStage::Output => &self.output,
        }
    }

    fn entries_mut(&mut self, stage: PipelineStage) -> &mut Vec<GuardrailEntry> {
        match stage {
            PipelineStage::Input => &mut self.input,
            PipelineStage::Output => &mut self.output,
        }
    }
}

/// Per-stage, per-enabled-state counts returned by `get_guardrail_status`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GuardrailStatus {
    pub input_guardrails: Vec<GuardrailStatusEntry>,
    pub output_guardrails: Vec<GuardrailStatusEntry>,
    pub total_enabled: usize,
    pub total: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct GuardrailStatusEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub guardrail_type: String,
    pub enabled: bool,
    pub on_error: OnError,
}

/// The pipeline engine: an ordered input stage and output stage of
/// guardrails, built from a [`PipelineConfig`]. Safe for concurrent calls
/// from multiple callers; `enable_guardrail`/`disable_guardrail`/`reload`
/// mutate shared state behind a lock and publish the result atomically so
/// in-flight evaluations keep using the stage list they started with
/// (mirrors the teacher's `SourceManager` hot-swap pattern, generalized
/// here to cover both config reload and enable/disable toggles).
pub struct Pipeline {
    stages: RwLock<Arc<Stages>>,
    /// Entries from the config that the factory could not construct;
    /// surfaced by the health monitor but never fatal to pipeline
    /// construction (spec §4.5: "silent empty pipelines are valid").
    construction_errors: RwLock<Vec<String>>,
    audit: &'static AuditTrail,
    health: HealthMonitor,
}

impl Pipeline {
    /// Builds a pipeline from `config`, skipping (and logging) any entry
    /// the registry fails to construct. Never fails: an empty pipeline
    /// (zero entries requested, or every entry rejected) is valid.
    pub fn from_config(config: &PipelineConfig, registry: &GuardrailRegistry) -> Self {
        let (input, input_errors) = build_stage(&config.pipeline.input, registry);
        let (output, output_errors) = build_stage(&config.pipeline.output, registry);
        let mut errors = input_errors;
        errors.extend(output_errors);

        Self {
            stages: RwLock::new(Arc::new(Stages { input, output })),
            construction_errors: RwLock::new(errors),
            audit: stinger_audit::get_global_audit_trail(),
            health: HealthMonitor::new(),
        }
    }

    /// A pipeline with no guardrails in either stage.
    pub fn empty() -> Self {
        Self {
            stages: RwLock::new(Arc::new(Stages::default())),
            construction_errors: RwLock::new(Vec::new()),
            audit: stinger_audit::get_global_audit_trail(),
            health: HealthMonitor::new(),
        }
    }

    pub fn construction_errors(&self) -> Vec<String> {
        self.construction_errors.read().clone()
    }

    /// Atomically replaces the stage lists with a freshly built pipeline
    /// from `config` (the hot-reload swap contract, SPEC_FULL.md §2). Calls
    /// already in flight keep evaluating against the `Arc<Stages>` snapshot
    /// they captured; only calls starting after this returns see the new
    /// config.
    pub fn reload(&self, config: &PipelineConfig, registry: &GuardrailRegistry) {
        let (input, input_errors) = build_stage(&config.pipeline.input, registry);
        let (output, output_errors) = build_stage(&config.pipeline.output, registry);
        let mut errors = input_errors;
        errors.extend(output_errors);
        *self.stages.write() = Arc::new(Stages { input, output });
        *self.construction_errors.write() = errors;
        tracing::info!("pipeline reloaded");
    }

    pub fn enable_guardrail(&self, name: &str, selector: StageSelector) {
        self.set_enabled(name, selector, true);
    }

    pub fn disable_guardrail(&self, name: &str, selector: StageSelector) {
        self.set_enabled(name, selector, false);
    }

    fn set_enabled(&self, name: &str, selector: StageSelector, enabled: bool) {
        let mut stages = (**self.stages.read()).clone();
        for stage in [PipelineStage::Input, PipelineStage::Output] {
            if !selector.matches(stage) {
                continue;
            }
            for entry in stages.entries_mut(stage) {
                if entry.name == name {
                    entry.enabled = enabled;
                }
            }
        }
        *self.stages.write() = Arc::new(stages);
    }

    pub fn get_guardrail_status(&self) -> GuardrailStatus {
        let stages = self.stages.read().clone();
        let to_entries = |list: &[GuardrailEntry]| -> Vec<GuardrailStatusEntry> {
            list.iter()
                .map(|e| GuardrailStatusEntry {
                    name: e.name.clone(),
                    guardrail_type: e.guardrail.guardrail_type().to_string(),
                    enabled: e.enabled,
                    on_error: e.on_error,
                })
                .collect()
        };
        let input_guardrails = to_entries(&stages.input);
        let output_guardrails = to_entries(&stages.output);
        let total = input_guardrails.len() + output_guardrails.len();
        let total_enabled = input_guardrails.iter().filter(|e| e.enabled).count()
            + output_guardrails.iter().filter(|e| e.enabled).count();
        GuardrailStatus {
            input_guardrails,
            output_guardrails,
            total_enabled,
            total,
        }
    }

    /// Every guardrail's `health_snapshot`, keyed by name, across both
    /// stages (a guardrail configured in both stages under the same name
    /// appears once; its snapshot reflects the guardrail instance, not the
    /// per-stage enabled flag).
    pub fn get_guardrail_configs(&self) -> BTreeMap<String, serde_json::Value> {
        let stages = self.stages.read().clone();
        let mut out = BTreeMap::new();
        for entry in stages.input.iter().chain(stages.output.iter()) {
            let snapshot = entry.guardrail.health_snapshot();
            out.insert(
                entry.name.clone(),
                serde_json::json!({
                    "name": entry.name,
                    "type": entry.guardrail.guardrail_type(),
                    "enabled": entry.enabled,
                    "on_error": entry.on_error,
                    "health": snapshot,
                }),
            );
        }
        out
    }

    pub fn update_guardrail_config(&self, name: &str, partial_config: &serde_json::Value) -> bool {
        let stages = self.stages.read().clone();
        let mut updated = false;
        for entry in stages.input.iter().chain(stages.output.iter()) {
            if entry.name == name && entry.guardrail.update_config(partial_config) {
                updated = true;
            }
        }
        updated
    }

    /// Async evaluation entry point (spec §4.5 steps 1-9).
    pub async fn check_input_async(
        &self,
        text: &str,
        conversation: Option<&Conversation>,
        api_key: Option<&str>,
    ) -> PipelineResult {
        self.check_async(PipelineStage::Input, text, conversation, api_key)
            .await
    }

    pub async fn check_output_async(
        &self,
        text: &str,
        conversation: Option<&Conversation>,
        api_key: Option<&str>,
    ) -> PipelineResult {
        self.check_async(PipelineStage::Output, text, conversation, api_key)
            .await
    }

    /// Blocking wrapper for callers that prefer a synchronous API.
    /// Uses a plain, non-tokio executor (spec §4.5: "implementations must
    /// avoid nested event loops") so it is safe to call even from a thread
    /// that happens to be inside a tokio runtime, at the cost of blocking
    /// that thread until evaluation completes.
    pub fn check_input(
        &self,
        text: &str,
        conversation: Option<&Conversation>,
        api_key: Option<&str>,
    ) -> PipelineResult {
        futures::executor::block_on(self.check_input_async(text, conversation, api_key))
    }

    pub fn check_output(
        &self,
        text: &str,
        conversation: Option<&Conversation>,
        api_key: Option<&str>,
    ) -> PipelineResult {
        futures::executor::block_on(self.check_output_async(text, conversation, api_key))
    }

    async fn check_async(
        &self,
        stage: PipelineStage,
        text: &str,
        conversation: Option<&Conversation>,
        api_key: Option<&str>,
    ) -> PipelineResult {
        let start = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let conversation_id = conversation.map(|c| c.conversation_id.clone());
        let user_id = conversation.map(|c| c.initiator.clone()).or(api_key.map(String::from));

        let event_label = if matches!(stage, PipelineStage::Input) {
            "user_prompt"
        } else {
            "llm_response"
        };
        if self.audit.is_enabled() {
            if event_label == "user_prompt" {
                self.audit.log_prompt(
                    text,
                    user_id.as_deref(),
                    conversation_id.as_deref(),
                    Some(&request_id),
                );
            } else {
                self.audit.log_response(
                    text,
                    user_id.as_deref(),
                    conversation_id.as_deref(),
                    Some(&request_id),
                    None,
                    None,
                );
            }
        }

        let stages = self.stages.read().clone();
        let entries: Vec<&GuardrailEntry> = stages
            .entries(stage)
            .iter()
            .filter(|e| e.enabled)
            .collect();

        // Run every enabled guardrail concurrently; the result order is
        // restored to declaration order afterward regardless of completion
        // order (spec §4.5 step 4, §5 ordering guarantees).
        let futures = entries.iter().map(|entry| {
            let entry = (*entry).clone();
            let conversation = conversation;
            async move {
                let result = entry.guardrail.analyze(text, conversation, None).await;
                (entry, result)
            }
        });
        let evaluated = futures::future::join_all(futures).await;

        let mut blocked = false;
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();
        let mut details = BTreeMap::new();

        for (entry, result) in evaluated {
            // `analyze` never throws in this Rust port (it returns a value,
            // not an exception); `on_error` recovery therefore only applies
            // to the synthesized path a caller-supplied adapter guardrail
            // might route through `GuardrailResult::error`. We still honor
            // the policy here for a result that already carries
            // `decision == "error"`, so a guardrail implemented as a thin
            // wrapper over a fallible external call (e.g. an LLM adapter)
            // gets the same recovery semantics spec §4.1/§4.5 describe.
            let result = apply_on_error_policy(entry.on_error, result);

            if result.blocked {
                blocked = true;
                reasons.push(result.reason.clone());
            } else if result.warned {
                warnings.push(result.reason.clone());
            }
            details.insert(entry.name.clone(), result);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        self.health.record_request(processing_time_ms, blocked);

        if self.audit.is_enabled() {
            for (name, result) in &details {
                let decision = result
                    .decision
                    .clone()
                    .unwrap_or_else(|| if result.blocked { "block" } else if result.warned { "warn" } else { "allow" }.to_string());
                self.audit.log_guardrail_decision(
                    name,
                    &decision,
                    &result.reason,
                    Some(result.confidence),
                    None,
                    user_id.as_deref(),
                    conversation_id.as_deref(),
                    Some(&request_id),
                );
            }
        }

        let pipeline_result = PipelineResult {
            blocked,
            reasons,
            warnings,
            details,
            pipeline_type: stage,
            conversation_id: conversation_id.clone(),
            processing_time_ms,
        };

        if let Some(conversation) = conversation {
            let as_value = serde_json::to_value(&pipeline_result)
                .unwrap_or_else(|_| serde_json::Value::Null);
            conversation.record_guardrail_results(
                text,
                matches!(stage, PipelineStage::Input),
                as_value,
            );
        }

        pipeline_result
    }

    /// Convenience wrapper around `HealthMonitor::get_system_health` that
    /// supplies `self` as the pipeline to report on.
    pub fn get_system_health(
        &self,
        api_keys_status: BTreeMap<String, bool>,
    ) -> crate::health::SystemHealth {
        self.health.get_system_health(Some(self), api_keys_status)
    }
}

/// Recovers a result that represents a synthesized adapter failure
/// (`decision == "error"`) by re-deriving `blocked`/`warned` from the
/// guardrail's configured `on_error` policy; passes through any real
/// allow/warn/block verdict unchanged (spec §4.5 step 5, §7 Evaluation
/// errors).
fn apply_on_error_policy(on_error: OnError, result: GuardrailResult) -> GuardrailResult {
    if result.decision.as_deref() != Some("error") {
        return result;
    }
    let blocked = matches!(on_error, OnError::Block);
    let warned = matches!(on_error, OnError::Warn);
    GuardrailResult {
        blocked,
        warned,
        reason: if blocked || warned {
            result.reason
        } else {
            String::new()
        },
        ..result
    }
}

fn build_stage(
    configs: &[GuardrailConfig],
    registry: &GuardrailRegistry,
) -> (Vec<GuardrailEntry>, Vec<String>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    for config in configs {
        match registry.create(config) {
            Ok(guardrail) => entries.push(GuardrailEntry {
                name: config.name.clone(),
                on_error: config.on_error,
                enabled: config.enabled,
                guardrail,
            }),
            Err(err) => {
                let message = format!("skipping guardrail '{}': {err}", config.name);
                tracing::error!("{message}");
                errors.push(message);
            }
        }
    }
    (entries, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stinger_types::{GuardrailConfig, OnError, PipelineConfig, StagesConfig};

    fn config_with(guardrails: Vec<GuardrailConfig>) -> PipelineConfig {
        PipelineConfig {
            version: "1.0".to_string(),
            pipeline: StagesConfig {
                input: guardrails,
                output: Vec::new(),
            },
        }
    }

    fn pii_entry(name: &str) -> GuardrailConfig {
        GuardrailConfig {
            name: name.to_string(),
            guardrail_type: "pii_detector".to_string(),
            enabled: true,
            on_error: OnError::Allow,
            config: json!({}),
        }
    }

    #[tokio::test]
    async fn empty_pipeline_allows_everything() {
        let pipeline = Pipeline::empty();
        let result = pipeline.check_input_async("anything", None, None).await;
        assert!(!result.blocked);
        assert!(result.details.is_empty());
    }

    #[tokio::test]
    async fn one_entry_per_enabled_guardrail() {
        let registry = GuardrailRegistry::new();
        let pipeline = Pipeline::from_config(&config_with(vec![pii_entry("pii")]), &registry);
        let result = pipeline
            .check_input_async("my SSN is 123-45-6789", None, None)
            .await;
        assert_eq!(result.details.len(), 1);
        assert!(result.blocked);
        assert_eq!(result.reasons.len(), 1);
    }

    #[tokio::test]
    async fn disabled_guardrail_does_not_run() {
        let registry = GuardrailRegistry::new();
        let mut entry = pii_entry("pii");
        entry.enabled = false;
        let pipeline = Pipeline::from_config(&config_with(vec![entry]), &registry);
        let result = pipeline
            .check_input_async("my SSN is 123-45-6789", None, None)
            .await;
        assert!(result.details.is_empty());
        assert!(!result.blocked);
    }

    #[tokio::test]
    async fn enable_disable_are_independent_per_stage() {
        let registry = GuardrailRegistry::new();
        let config = PipelineConfig {
            version: "1.0".to_string(),
            pipeline: StagesConfig {
                input: vec![pii_entry("pii")],
                output: vec![pii_entry("pii")],
            },
        };
        let pipeline = Pipeline::from_config(&config, &registry);
        pipeline.disable_guardrail("pii", StageSelector::Input);

        let input_status = pipeline.get_guardrail_status();
        assert!(!input_status.input_guardrails[0].enabled);
        assert!(input_status.output_guardrails[0].enabled);
    }

    #[tokio::test]
    async fn invalid_entry_is_skipped_not_fatal() {
        let registry = GuardrailRegistry::new();
        let bad = GuardrailConfig {
            name: "bad".to_string(),
            guardrail_type: "does_not_exist".to_string(),
            enabled: true,
            on_error: OnError::Allow,
            config: json!({}),
        };
        let pipeline = Pipeline::from_config(&config_with(vec![bad, pii_entry("pii")]), &registry);
        assert_eq!(pipeline.construction_errors().len(), 1);
        let status = pipeline.get_guardrail_status();
        assert_eq!(status.total, 1);
    }

    #[tokio::test]
    async fn allow_clean_text() {
        let registry = GuardrailRegistry::new();
        let pipeline = Pipeline::from_config(&config_with(vec![pii_entry("pii")]), &registry);
        let result = pipeline.check_input_async("what are your hours?", None, None).await;
        assert!(!result.blocked);
        assert!(result.warnings.is_empty());
        assert!(result.reasons.is_empty());
    }
}
