//! Length-bound guardrail: flags text shorter than `min_length` or longer
//! than `max_length`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use stinger_conversation::Conversation;
use stinger_types::{GuardrailConfig, GuardrailError, GuardrailResult, StingerResult};
use tokio_util::sync::CancellationToken;

use crate::action::DetectionAction;
use crate::guardrail::Guardrail;

fn default_max_length() -> usize {
    10_000
}

#[derive(Debug, Deserialize)]
struct LengthOptions {
    #[serde(default)]
    min_length: usize,
    #[serde(default = "default_max_length")]
    max_length: usize,
    #[serde(default)]
    action: DetectionAction,
}

impl Default for LengthOptions {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: default_max_length(),
            action: DetectionAction::default(),
        }
    }
}

pub struct LengthGuardrail {
    name: String,
    options: LengthOptions,
}

impl LengthGuardrail {
    pub fn from_config(config: &GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> {
        let options: LengthOptions = if config.config.as_object().is_some_and(|m| m.is_empty()) {
            LengthOptions::default()
        } else {
            serde_json::from_value(config.config.clone()).map_err(|e| {
                GuardrailError::ConfigurationError(format!("invalid length_check config: {e}"))
            })?
        };
        if options.min_length > options.max_length {
            return Err(GuardrailError::ConfigurationError(
                "min_length cannot exceed max_length".to_string(),
            )
            .into());
        }
        Ok(Arc::new(LengthGuardrail {
            name: config.name.clone(),
            options,
        }))
    }
}

#[async_trait]
impl Guardrail for LengthGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn guardrail_type(&self) -> &str {
        "length_check"
    }

    async fn analyze(
        &self,
        text: &str,
        _conversation: Option<&Conversation>,
        _cancel: Option<&CancellationToken>,
    ) -> GuardrailResult {
        let len = text.chars().count();
        if len < self.options.min_length {
            return self.options.action.verdict(
                &self.name,
                self.guardrail_type(),
                format!("text length {len} is below minimum {}", self.options.min_length),
                1.0,
                vec!["too_short".to_string()],
            );
        }
        if len > self.options.max_length {
            return self.options.action.verdict(
                &self.name,
                self.guardrail_type(),
                format!("text length {len} exceeds maximum {}", self.options.max_length),
                1.0,
                vec!["too_long".to_string()],
            );
        }
        GuardrailResult::allow(&self.name, self.guardrail_type())
    }

    fn health_snapshot(&self) -> std::collections::BTreeMap<String, Value> {
        std::collections::BTreeMap::from([
            ("name".to_string(), Value::from(self.name.as_str())),
            ("type".to_string(), Value::from(self.guardrail_type())),
            ("available".to_string(), Value::from(true)),
            ("max_length".to_string(), Value::from(self.options.max_length)),
        ])
    }
}
