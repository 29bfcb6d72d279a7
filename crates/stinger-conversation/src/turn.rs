//! A single turn within a conversation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of a conversation: a prompt, and (once the turn is complete)
/// its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub timestamp: DateTime<Utc>,
    pub speaker: String,
    pub listener: String,
    pub prompt: String,
    pub response: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Turn {
    pub fn new_incomplete(
        speaker: impl Into<String>,
        listener: impl Into<String>,
        prompt: impl Into<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            speaker: speaker.into(),
            listener: listener.into(),
            prompt: prompt.into(),
            response: None,
            metadata,
        }
    }

    pub fn new_complete(
        speaker: impl Into<String>,
        listener: impl Into<String>,
        prompt: impl Into<String>,
        response: impl Into<String>,
        metadata: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            speaker: speaker.into(),
            listener: listener.into(),
            prompt: prompt.into(),
            response: Some(response.into()),
            metadata,
        }
    }

    /// A turn is complete iff `response` is present.
    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }
}
