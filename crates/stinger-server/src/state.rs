//! Shared server state: the pipeline, presets cache, and the configured
//! set of API-key hashes (spec §6.4 authentication).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use stinger_engine::{Pipeline, StingerResult};

/// Maximum request body accepted before the `tower_http::limit` layer
/// rejects it (spec §6.4: "total body ≤ 1 MB (default, configurable)").
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Hard per-field upper bounds from spec §6.4.
pub const MAX_TEXT_BYTES: usize = 100 * 1024;
pub const MAX_CONTEXT_BYTES: usize = 10 * 1024;
pub const MAX_PRESET_CHARS: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub pipelines: Arc<PresetPipelines>,
    /// SHA-256 hashes of accepted API keys. Checked against the presented
    /// key's digest, never the key itself (spec §6.4).
    pub api_key_hashes: Arc<HashSet<String>>,
    /// Whether the `X-API-Key` check runs at all. When `true` and
    /// `api_key_hashes` is empty, every request gets 503 (misconfigured
    /// deployment) rather than silently passing through (spec §6.4: "no
    /// keys configured → 503").
    pub auth_enabled: bool,
}

/// Caches one constructed `Pipeline` per preset name so `/v1/check` and
/// `/v1/rules` don't rebuild guardrails on every request.
pub struct PresetPipelines {
    by_preset: BTreeMap<String, Arc<Pipeline>>,
}

impl PresetPipelines {
    pub fn build() -> StingerResult<Self> {
        let mut by_preset = BTreeMap::new();
        for name in stinger_engine::presets::PRESET_NAMES {
            by_preset.insert((*name).to_string(), Arc::new(Pipeline::from_preset(name)?));
        }
        Ok(Self { by_preset })
    }

    pub fn get(&self, preset: &str) -> Option<Arc<Pipeline>> {
        self.by_preset.get(preset).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_preset.keys().map(String::as_str)
    }
}

impl AppState {
    pub fn new(
        pipelines: PresetPipelines,
        api_keys: impl IntoIterator<Item = String>,
        auth_enabled: bool,
    ) -> Self {
        let hashes: HashSet<String> = api_keys.into_iter().map(|key| hash_api_key(&key)).collect();
        Self {
            pipelines: Arc::new(pipelines),
            api_key_hashes: Arc::new(hashes),
            auth_enabled,
        }
    }

    /// Unauthenticated local-dev/test construction: no `X-API-Key` check.
    pub fn without_auth(pipelines: PresetPipelines) -> Self {
        Self::new(pipelines, std::iter::empty(), false)
    }
}

pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
