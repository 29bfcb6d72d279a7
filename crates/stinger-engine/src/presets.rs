//! Named, bundled configurations for common deployment shapes (spec §6.1).
//!
//! Confirmed by `examples/getting_started/07_cli_and_yaml_config.py` and
//! `demos/demo_presets.py` in `original_source/`: presets are just
//! YAML-shaped configs shipped with the library, parsed through the same
//! loader a user-supplied config file goes through. Embedding them with
//! `include_str!` keeps the six names resolvable without a filesystem
//! lookup at runtime (SPEC_FULL.md §2).

use stinger_types::{PipelineConfig, StingerError, StingerResult};

use crate::config::from_yaml_str;

const BASIC: &str = include_str!("presets/basic.yaml");
const CUSTOMER_SERVICE: &str = include_str!("presets/customer_service.yaml");
const MEDICAL: &str = include_str!("presets/medical.yaml");
const EDUCATIONAL: &str = include_str!("presets/educational.yaml");
const FINANCIAL: &str = include_str!("presets/financial.yaml");
const CONTENT_MODERATION: &str = include_str!("presets/content_moderation.yaml");

/// The preset names recognized by `Pipeline::from_preset` (spec §6.1).
pub const PRESET_NAMES: &[&str] = &[
    "basic",
    "customer_service",
    "medical",
    "educational",
    "financial",
    "content_moderation",
];

/// Resolves a preset name to its embedded YAML config.
pub fn load(name: &str) -> StingerResult<PipelineConfig> {
    let yaml = match name {
        "basic" => BASIC,
        "customer_service" => CUSTOMER_SERVICE,
        "medical" => MEDICAL,
        "educational" => EDUCATIONAL,
        "financial" => FINANCIAL,
        "content_moderation" => CONTENT_MODERATION,
        other => {
            return Err(StingerError::InvalidInput(format!(
                "unknown preset '{other}'; expected one of {PRESET_NAMES:?}"
            )))
        }
    };
    from_yaml_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_parses() {
        for name in PRESET_NAMES {
            load(name).unwrap_or_else(|e| panic!("preset '{name}' failed to parse: {e}"));
        }
    }

    #[test]
    fn unknown_preset_is_an_invalid_input_error() {
        let err = load("does_not_exist").unwrap_err();
        assert!(matches!(err, StingerError::InvalidInput(_)));
    }
}
