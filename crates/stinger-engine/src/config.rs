//! Minimal YAML-to-`PipelineConfig` loader (SPEC_FULL.md §1 "ambient
//! stack"). Schema validation and semantic checks belong to the caller
//! per spec.md §1; this is the thin wrapper the CLI and server need to
//! have something to call.

use std::path::Path;

use stinger_types::{PipelineConfig, StingerError, StingerResult};

/// Parses a YAML document (already read into memory) into a
/// [`PipelineConfig`].
pub fn from_yaml_str(yaml: &str) -> StingerResult<PipelineConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| StingerError::InvalidInput(format!("invalid pipeline config YAML: {e}")))
}

/// Reads and parses a YAML config file from disk.
pub fn load_file(path: impl AsRef<Path>) -> StingerResult<PipelineConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(StingerError::Io)?;
    from_yaml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let yaml = r#"
version: "1.0"
pipeline:
  input:
    - name: pii
      type: pii_detector
      enabled: true
      on_error: block
  output: []
"#;
        let config = from_yaml_str(yaml).unwrap();
        assert_eq!(config.pipeline.input.len(), 1);
        assert_eq!(config.pipeline.input[0].name, "pii");
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = from_yaml_str("not: [valid: yaml").unwrap_err();
        assert!(matches!(err, StingerError::InvalidInput(_)));
    }
}
