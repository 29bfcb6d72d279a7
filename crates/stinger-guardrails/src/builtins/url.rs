//! URL guardrail: flags any URL, or only URLs outside an allow-list of
//! domains when one is configured.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use stinger_conversation::Conversation;
use stinger_types::{GuardrailConfig, GuardrailError, GuardrailResult, StingerResult};
use tokio_util::sync::CancellationToken;

use crate::action::DetectionAction;
use crate::guardrail::Guardrail;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://([A-Za-z0-9.-]+)(?:[/:?#][^\s]*)?").unwrap());

#[derive(Debug, Deserialize, Default)]
struct UrlOptions {
    #[serde(default)]
    allowed_domains: Vec<String>,
    #[serde(default)]
    action: DetectionAction,
}

pub struct UrlGuardrail {
    name: String,
    options: UrlOptions,
}

impl UrlGuardrail {
    pub fn from_config(config: &GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> {
        let options: UrlOptions = if config.config.as_object().is_some_and(|m| m.is_empty()) {
            UrlOptions::default()
        } else {
            serde_json::from_value(config.config.clone()).map_err(|e| {
                GuardrailError::ConfigurationError(format!("invalid url_check config: {e}"))
            })?
        };
        Ok(Arc::new(UrlGuardrail {
            name: config.name.clone(),
            options,
        }))
    }

    fn disallowed_domains(&self, text: &str) -> Vec<String> {
        URL_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .filter(|domain| {
                self.options.allowed_domains.is_empty()
                    || !self
                        .options
                        .allowed_domains
                        .iter()
                        .any(|allowed| domain == allowed || domain.ends_with(&format!(".{allowed}")))
            })
            .collect()
    }
}

#[async_trait]
impl Guardrail for UrlGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn guardrail_type(&self) -> &str {
        "url_check"
    }

    async fn analyze(
        &self,
        text: &str,
        _conversation: Option<&Conversation>,
        _cancel: Option<&CancellationToken>,
    ) -> GuardrailResult {
        let domains = self.disallowed_domains(text);
        if domains.is_empty() {
            return GuardrailResult::allow(&self.name, self.guardrail_type());
        }
        self.options.action.verdict(
            &self.name,
            self.guardrail_type(),
            format!("found URL(s) for disallowed domain(s): {}", domains.join(", ")),
            0.8,
            domains,
        )
    }

    fn health_snapshot(&self) -> std::collections::BTreeMap<String, Value> {
        std::collections::BTreeMap::from([
            ("name".to_string(), Value::from(self.name.as_str())),
            ("type".to_string(), Value::from(self.guardrail_type())),
            ("available".to_string(), Value::from(true)),
            (
                "allowed_domain_count".to_string(),
                Value::from(self.options.allowed_domains.len()),
            ),
        ])
    }
}
