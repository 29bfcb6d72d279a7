//! Regex-based PII detector: email, phone, SSN, and credit-card patterns.

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

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b").unwrap());
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static CREDIT_CARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap());

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum PiiCategory {
    Email,
    Phone,
    Ssn,
    CreditCard,
}

fn default_categories() -> Vec<PiiCategory> {
    vec![
        PiiCategory::Email,
        PiiCategory::Phone,
        PiiCategory::Ssn,
        PiiCategory::CreditCard,
    ]
}

#[derive(Debug, Deserialize)]
struct PiiOptions {
    #[serde(default = "default_categories")]
    categories: Vec<PiiCategory>,
    #[serde(default)]
    action: DetectionAction,
}

impl Default for PiiOptions {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            action: DetectionAction::default(),
        }
    }
}

pub struct PiiGuardrail {
    name: String,
    options: PiiOptions,
}

impl PiiGuardrail {
    pub fn from_config(config: &GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> {
        let options: PiiOptions = if config.config.as_object().is_some_and(|m| m.is_empty()) {
            PiiOptions::default()
        } else {
            serde_json::from_value(config.config.clone()).map_err(|e| {
                GuardrailError::ConfigurationError(format!("invalid pii_detector config: {e}"))
            })?
        };
        Ok(Arc::new(PiiGuardrail {
            name: config.name.clone(),
            options,
        }))
    }

    fn matches(&self, text: &str) -> Vec<String> {
        let mut hits = Vec::new();
        for category in &self.options.categories {
            let (label, re): (&str, &Regex) = match category {
                PiiCategory::Email => ("email", &EMAIL_RE),
                PiiCategory::Phone => ("phone", &PHONE_RE),
                PiiCategory::Ssn => ("ssn", &SSN_RE),
                PiiCategory::CreditCard => ("credit_card", &CREDIT_CARD_RE),
            };
            if re.is_match(text) {
                hits.push(label.to_string());
            }
        }
        hits
    }
}

#[async_trait]
impl Guardrail for PiiGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn guardrail_type(&self) -> &str {
        "pii_detector"
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
            format!("detected PII categories: {}", hits.join(", ")),
            0.9,
            hits,
        )
    }

    fn health_snapshot(&self) -> std::collections::BTreeMap<String, Value> {
        std::collections::BTreeMap::from([
            ("name".to_string(), Value::from(self.name.as_str())),
            ("type".to_string(), Value::from(self.guardrail_type())),
            ("available".to_string(), Value::from(true)),
            (
                "categories".to_string(),
                Value::from(self.options.categories.len()),
            ),
        ])
    }
}
