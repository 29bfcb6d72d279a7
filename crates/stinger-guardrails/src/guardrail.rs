//! The guardrail trait contract (spec §4.1).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use stinger_conversation::Conversation;
use stinger_types::GuardrailResult;
use tokio_util::sync::CancellationToken;

/// A pluggable content detector run by the pipeline engine against a single
/// piece of text (a prompt on the input stage, a response on the output
/// stage).
///
/// Implementations must tolerate concurrent `analyze` calls from multiple
/// pipeline invocations and must not mutate the conversation they're given —
/// the engine, not the guardrail, owns turn bookkeeping (spec §4.5 step 8).
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// The guardrail's configured name (distinct from its type tag; see
    /// `guardrail_type`).
    fn name(&self) -> &str;

    /// The registry tag this guardrail was constructed from.
    fn guardrail_type(&self) -> &str;

    /// Inspect `text`. `cancel`, if supplied, should be polled at
    /// suspension points for implementations that do I/O; a cooperatively
    /// cancelled call should return promptly with an `allow` result rather
    /// than blocking indefinitely.
    async fn analyze(
        &self,
        text: &str,
        conversation: Option<&Conversation>,
        cancel: Option<&CancellationToken>,
    ) -> GuardrailResult;

    /// Synchronous, must not block on network. Used by the pipeline's
    /// status queries and the health monitor.
    fn is_available(&self) -> bool {
        true
    }

    /// `{name, type, enabled, available, extra counts}` at minimum.
    fn health_snapshot(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("name".to_string(), Value::from(self.name())),
            ("type".to_string(), Value::from(self.guardrail_type())),
            ("available".to_string(), Value::from(self.is_available())),
        ])
    }

    /// Optional: apply a partial config update atomically. Returns `false`
    /// if the guardrail does not support reconfiguration.
    fn update_config(&self, _partial_config: &Value) -> bool {
        false
    }
}
