//! Guardrail registry & factory (spec §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde_json::Value;
use stinger_types::{GuardrailConfig, GuardrailError, StingerResult};

use crate::builtins::{KeywordGuardrail, LengthGuardrail, PiiGuardrail, UrlGuardrail};
use crate::guardrail::Guardrail;

pub type GuardrailConstructor =
    Arc<dyn Fn(&GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> + Send + Sync>;

/// Translates `{type, name, config}` into a constructed guardrail.
///
/// The factory never inspects `config.config`; that nested map is the
/// guardrail constructor's business alone (the config-nesting invariant,
/// spec §8 property 7).
pub struct GuardrailRegistry {
    constructors: RwLock<HashMap<String, GuardrailConstructor>>,
}

impl Default for GuardrailRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardrailRegistry {
    /// An empty registry with no built-ins registered.
    pub fn empty() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// A registry pre-populated with the built-in guardrails.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register("pii_detector", Arc::new(PiiGuardrail::from_config));
        registry.register("keyword_blocklist", Arc::new(KeywordGuardrail::from_config));
        registry.register("length_check", Arc::new(LengthGuardrail::from_config));
        registry.register("url_check", Arc::new(UrlGuardrail::from_config));
        registry
    }

    /// Idempotent per tag; re-registration replaces the existing
    /// constructor.
    pub fn register(&self, tag: impl Into<String>, constructor: GuardrailConstructor) {
        self.constructors.write().insert(tag.into(), constructor);
    }

    pub fn registered_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.constructors.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn create(&self, config: &GuardrailConfig) -> StingerResult<Arc<dyn Guardrail>> {
        let constructors = self.constructors.read();
        let constructor = constructors
            .get(&config.guardrail_type)
            .ok_or_else(|| GuardrailError::InvalidGuardrailType(config.guardrail_type.clone()))?;
        constructor(config)
    }

    /// Same as `create`, but accepts a raw JSON value and validates that it
    /// at least contains `name` and `type` before dispatching, per spec
    /// §4.2.
    pub fn create_from_config(&self, config: Value) -> StingerResult<Arc<dyn Guardrail>> {
        let parsed: GuardrailConfig = serde_json::from_value(config).map_err(|e| {
            GuardrailError::ConfigurationError(format!(
                "guardrail config must contain 'name' and 'type': {e}"
            ))
        })?;
        self.create(&parsed)
    }
}

static GLOBAL: OnceCell<GuardrailRegistry> = OnceCell::new();

/// The process-wide registry, pre-populated with the built-in guardrails on
/// first access.
pub fn get_global_registry() -> &'static GuardrailRegistry {
    GLOBAL.get_or_init(GuardrailRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_fails_with_invalid_guardrail_type() {
        let registry = GuardrailRegistry::new();
        let config = GuardrailConfig {
            name: "x".to_string(),
            guardrail_type: "does_not_exist".to_string(),
            enabled: true,
            on_error: Default::default(),
            config: json!({}),
        };
        let err = registry.create(&config).unwrap_err();
        assert!(matches!(
            err,
            stinger_types::StingerError::Guardrail(GuardrailError::InvalidGuardrailType(_))
        ));
    }

    #[test]
    fn missing_name_or_type_fails_with_configuration_error() {
        let registry = GuardrailRegistry::new();
        let err = registry
            .create_from_config(json!({"type": "length_check"}))
            .unwrap_err();
        assert!(matches!(
            err,
            stinger_types::StingerError::Guardrail(GuardrailError::ConfigurationError(_))
        ));
    }

    #[test]
    fn re_registration_replaces_constructor() {
        let registry = GuardrailRegistry::empty();
        registry.register("length_check", Arc::new(LengthGuardrail::from_config));
        registry.register("length_check", Arc::new(LengthGuardrail::from_config));
        assert_eq!(registry.registered_tags(), vec!["length_check".to_string()]);
    }

    #[test]
    fn config_nesting_is_respected_by_factory() {
        let registry = GuardrailRegistry::new();
        let config = GuardrailConfig {
            name: "len".to_string(),
            guardrail_type: "length_check".to_string(),
            enabled: true,
            on_error: Default::default(),
            config: json!({"max_length": 5}),
        };
        let guardrail = registry.create(&config).unwrap();
        assert_eq!(guardrail.name(), "len");
    }
}
