//! Blocklist guardrail: flags text containing any configured keyword.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use stinger_conversation::Conversation;
use stinger_types::{GuardrailConfig, GuardrailError, GuardrailResult, StingerResult};
use tokio_util::sync::CancellationToken;

use crate::action::DetectionAction;
use crate::guardrail::Guardrail;

#[derive(Debug, Deserialize, Default)]
struct KeywordOptions {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    action: DetectionAction,
}

pub struct KeywordGuardrail {
    name: String,
    options: KeywordOptions,
}

impl KeywordGuardrail {
    pub fn from_config(config: &GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> {
        let options: KeywordOptions = if config.config.as_object().is_some_and(|m| m.is_empty()) {
            KeywordOptions::default()
        } else {
            serde_json::from_value(config.config.clone()).map_err(|e| {
                GuardrailError::ConfigurationError(format!("invalid keyword_blocklist config: {e}"))
            })?
        };
        if options.keywords.is_empty() {
            return Err(GuardrailError::MissingRequiredField(
                "config.keywords".to_string(),
            )
            .into());
        }
        Ok(Arc::new(KeywordGuardrail {
            name: config.name.clone(),
            options,
        }))
    }

    fn matches(&self, text: &str) -> Vec<String> {
        let haystack = if self.options.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };
        self.options
            .keywords
            .iter()
            .filter(|kw| {
                let needle = if self.options.case_sensitive {
                    (*kw).clone()
                } else {
                    kw.to_lowercase()
                };
                haystack.contains(&needle)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Guardrail for KeywordGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn guardrail_type(&self) -> &str {
        "keyword_blocklist"
    }

    async fn analyze(
        &self,
        text: &str,
        _conversation: Option<&Conversation>,
        _cancel: Option<&CancellationToken>,
    ) -> GuardrailResult {
        let hits = self.matches(text);
        if hits.is_empty() {
            return GuardrailResult::allow(&self.name, self.guardrail_type());
        }
        self.options.action.verdict(
            &self.name,
            self.guardrail_type(),
            format!("matched blocked keyword(s): {}", hits.join(", ")),
            1.0,
            hits,
        )
    }

    fn health_snapshot(&self) -> std::collections::BTreeMap<String, Value> {
        std::collections::BTreeMap::from([
            ("name".to_string(), Value::from(self.name.as_str())),
            ("type".to_string(), Value::from(self.guardrail_type())),
            ("available".to_string(), Value::from(true)),
            (
                "keyword_count".to_string(),
                Value::from(self.options.keywords.len()),
            ),
        ])
    }
}
