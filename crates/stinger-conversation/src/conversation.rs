//! The conversation model: a thread-safe, ordered turn log between two
//! participants with a per-conversation sliding-window rate limit
//! (spec §4.3).

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stinger_types::{StingerError, StingerResult};
use uuid::Uuid;

use crate::rate_limit::{self, RateLimitAction};
use crate::turn::Turn;

/// Tag describing the kind of participant on either side of a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantType {
    Human,
    AiModel,
    Bot,
    Agent,
}

struct Inner {
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    turns: Vec<Turn>,
    rate_limit: BTreeMap<String, i64>,
    rate_limit_turns: VecDeque<DateTime<Utc>>,
}

/// A unit of multi-turn context between two participants.
///
/// A single mutex serializes all mutation of `turns`, `last_activity`, and
/// `rate_limit_turns` (spec §4.3). A `Conversation` is exclusively owned by
/// its caller: the pipeline reads its history and appends turns through a
/// transient borrow, never retaining a reference after the call returns.
pub struct Conversation {
    pub conversation_id: String,
    pub initiator: String,
    pub responder: String,
    pub initiator_type: ParticipantType,
    pub responder_type: ParticipantType,
    pub model_info: BTreeMap<String, Value>,
    inner: Mutex<Inner>,
}

/// Serializable snapshot used by `to_dict`/`from_dict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversationSnapshot {
    conversation_id: String,
    initiator: String,
    responder: String,
    initiator_type: ParticipantType,
    responder_type: ParticipantType,
    #[serde(default)]
    model_info: BTreeMap<String, Value>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    #[serde(default)]
    turns: Vec<Turn>,
    #[serde(default)]
    rate_limit: BTreeMap<String, i64>,
}

/// Builder returned by the factory constructors (`human_ai`, `bot_bot`, ...).
pub struct ConversationBuilder {
    conversation_id: Option<String>,
    initiator: String,
    responder: String,
    initiator_type: ParticipantType,
    responder_type: ParticipantType,
    model_info: BTreeMap<String, Value>,
    metadata: BTreeMap<String, Value>,
    rate_limit: BTreeMap<String, i64>,
}

impl ConversationBuilder {
    fn new(
        initiator: impl Into<String>,
        responder: impl Into<String>,
        initiator_type: ParticipantType,
        responder_type: ParticipantType,
    ) -> Self {
        Self {
            conversation_id: None,
            initiator: initiator.into(),
            responder: responder.into(),
            initiator_type,
            responder_type,
            model_info: BTreeMap::new(),
            metadata: BTreeMap::new(),
            rate_limit: BTreeMap::new(),
        }
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn model_info(mut self, model_info: BTreeMap<String, Value>) -> Self {
        self.model_info = model_info;
        self
    }

    pub fn metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn rate_limit(mut self, rate_limit: BTreeMap<String, i64>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn build(self) -> Conversation {
        let now = Utc::now();
        Conversation {
            conversation_id: self
                .conversation_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            initiator: self.initiator,
            responder: self.responder,
            initiator_type: self.initiator_type,
            responder_type: self.responder_type,
            model_info: self.model_info,
            inner: Mutex::new(Inner {
                metadata: self.metadata,
                created_at: now,
                last_activity: now,
                turns: Vec::new(),
                rate_limit: self.rate_limit,
                rate_limit_turns: VecDeque::new(),
            }),
        }
    }
}

impl Conversation {
    /// Human caller talking to an AI model — the common customer-facing
    /// shape.
    pub fn human_ai(initiator: impl Into<String>, responder: impl Into<String>) -> ConversationBuilder {
        ConversationBuilder::new(initiator, responder, ParticipantType::Human, ParticipantType::AiModel)
    }

    /// Two automated bots talking to each other.
    pub fn bot_bot(initiator: impl Into<String>, responder: impl Into<String>) -> ConversationBuilder {
        ConversationBuilder::new(initiator, responder, ParticipantType::Bot, ParticipantType::Bot)
    }

    /// Two agents talking to each other.
    pub fn agent_agent(initiator: impl Into<String>, responder: impl Into<String>) -> ConversationBuilder {
        ConversationBuilder::new(initiator, responder, ParticipantType::Agent, ParticipantType::Agent)
    }

    /// Two humans talking to each other.
    pub fn human_human(initiator: impl Into<String>, responder: impl Into<String>) -> ConversationBuilder {
        ConversationBuilder::new(initiator, responder, ParticipantType::Human, ParticipantType::Human)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.lock().created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.inner.lock().last_activity
    }

    pub fn metadata(&self) -> BTreeMap<String, Value> {
        self.inner.lock().metadata.clone()
    }

    pub fn rate_limit(&self) -> BTreeMap<String, i64> {
        self.inner.lock().rate_limit.clone()
    }

    /// Append a new incomplete turn, recording the event against the
    /// conversation's rate-limit window.
    pub fn add_prompt(&self, text: impl Into<String>, metadata: Option<BTreeMap<String, Value>>) -> Turn {
        let mut inner = self.inner.lock();
        let turn = Turn::new_incomplete(
            &self.initiator,
            &self.responder,
            text,
            metadata.unwrap_or_default(),
        );
        let now = Utc::now();
        inner.turns.push(turn.clone());
        inner.rate_limit_turns.push_back(now);
        inner.last_activity = now;
        let rate_limit = inner.rate_limit.clone();
        rate_limit::evict(&mut inner.rate_limit_turns, &rate_limit);
        turn
    }

    /// Complete the most recent incomplete turn with `text`.
    ///
    /// Fails with `IllegalState` if there is no incomplete turn to complete
    /// (spec §4.3).
    pub fn add_response(&self, text: impl Into<String>) -> StingerResult<Turn> {
        let mut inner = self.inner.lock();
        let text = text.into();
        let turn = inner
            .turns
            .iter_mut()
            .rev()
            .find(|t| !t.is_complete())
            .ok_or_else(|| {
                StingerError::IllegalState(
                    "add_response called with no incomplete turn".to_string(),
                )
            })?;
        turn.response = Some(text);
        inner.last_activity = Utc::now();
        Ok(turn.clone())
    }

    /// Append a complete turn atomically.
    pub fn add_exchange(
        &self,
        prompt: impl Into<String>,
        response: impl Into<String>,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Turn {
        let mut inner = self.inner.lock();
        let turn = Turn::new_complete(
            &self.initiator,
            &self.responder,
            prompt,
            response,
            metadata.unwrap_or_default(),
        );
        let now = Utc::now();
        inner.turns.push(turn.clone());
        inner.rate_limit_turns.push_back(now);
        inner.last_activity = now;
        let rate_limit = inner.rate_limit.clone();
        rate_limit::evict(&mut inner.rate_limit_turns, &rate_limit);
        turn
    }

    /// Legacy convenience: equivalent to `add_exchange` if `response` is
    /// given, else `add_prompt`.
    pub fn add_turn(&self, prompt: impl Into<String>, response: Option<String>) -> Turn {
        match response {
            Some(r) => self.add_exchange(prompt, r, None),
            None => self.add_prompt(prompt, None),
        }
    }

    /// A defensive copy of the last `limit` turns (all if `None`).
    pub fn get_history(&self, limit: Option<usize>) -> Vec<Turn> {
        let inner = self.inner.lock();
        match limit {
            Some(n) if n < inner.turns.len() => inner.turns[inner.turns.len() - n..].to_vec(),
            _ => inner.turns.clone(),
        }
    }

    pub fn get_turn_count(&self) -> usize {
        self.inner.lock().turns.len()
    }

    pub fn get_complete_turn_count(&self) -> usize {
        self.inner.lock().turns.iter().filter(|t| t.is_complete()).count()
    }

    pub fn get_incomplete_turns(&self) -> Vec<Turn> {
        self.inner
            .lock()
            .turns
            .iter()
            .filter(|t| !t.is_complete())
            .cloned()
            .collect()
    }

    pub fn get_complete_turns(&self) -> Vec<Turn> {
        self.inner
            .lock()
            .turns
            .iter()
            .filter(|t| t.is_complete())
            .cloned()
            .collect()
    }

    /// Attach `guardrail_results` to the metadata of the most recent turn,
    /// creating a fresh incomplete turn first if none exists (used by the
    /// pipeline engine's input/output post-processing, spec §4.5 step 8).
    pub fn record_guardrail_results(&self, text: &str, stage_is_input: bool, results: Value) {
        let mut inner = self.inner.lock();
        if stage_is_input {
            let mut turn = Turn::new_incomplete(&self.initiator, &self.responder, text, BTreeMap::new());
            turn.metadata.insert("guardrail_results".to_string(), results);
            let now = Utc::now();
            inner.turns.push(turn);
            inner.rate_limit_turns.push_back(now);
            inner.last_activity = now;
            let rate_limit = inner.rate_limit.clone();
            rate_limit::evict(&mut inner.rate_limit_turns, &rate_limit);
        } else {
            let needs_new = !inner.turns.iter().any(|t| !t.is_complete());
            if needs_new {
                let turn = Turn::new_incomplete(&self.initiator, &self.responder, "", BTreeMap::new());
                inner.turns.push(turn);
            }
            if let Some(turn) = inner.turns.iter_mut().rev().find(|t| !t.is_complete()) {
                turn.response = Some(text.to_string());
                turn.metadata.insert("guardrail_results".to_string(), results);
            }
            inner.last_activity = Utc::now();
        }
    }

    /// `true` iff any configured limit is currently exceeded. Does not
    /// consume quota; recording happens implicitly in `add_prompt`/`add_exchange`.
    pub fn check_rate_limit(&self, action: RateLimitAction) -> bool {
        let inner = self.inner.lock();
        let exceeded = rate_limit::is_exceeded(&inner.rate_limit_turns, &inner.rate_limit);
        if exceeded {
            match action {
                RateLimitAction::Raise => tracing::error!(
                    conversation_id = %self.conversation_id,
                    "conversation rate limit exceeded"
                ),
                RateLimitAction::Warn => tracing::warn!(
                    conversation_id = %self.conversation_id,
                    "conversation rate limit exceeded"
                ),
                RateLimitAction::Log => tracing::info!(
                    conversation_id = %self.conversation_id,
                    "conversation rate limit exceeded"
                ),
                RateLimitAction::Silent => {}
            }
        }
        exceeded
    }

    /// Convenience wrapper around `check_rate_limit(Raise)` that actually
    /// returns an error instead of only logging one, for callers that want
    /// `?`-style propagation.
    pub fn ensure_rate_limit_ok(&self) -> StingerResult<()> {
        if self.check_rate_limit(RateLimitAction::Raise) {
            Err(StingerError::IllegalState(format!(
                "rate limit exceeded for conversation {}",
                self.conversation_id
            )))
        } else {
            Ok(())
        }
    }

    pub fn set_rate_limit(&self, config: BTreeMap<String, i64>) {
        let mut inner = self.inner.lock();
        inner.rate_limit = config;
        let rate_limit = inner.rate_limit.clone();
        rate_limit::evict(&mut inner.rate_limit_turns, &rate_limit);
    }

    pub fn reset_rate_limit(&self) {
        let mut inner = self.inner.lock();
        inner.rate_limit_turns.clear();
    }

    /// Serialize the full conversation state, preserving every field
    /// `from_dict` needs to round-trip it (spec §8 round-trip law).
    pub fn to_dict(&self) -> Value {
        let inner = self.inner.lock();
        let snapshot = ConversationSnapshot {
            conversation_id: self.conversation_id.clone(),
            initiator: self.initiator.clone(),
            responder: self.responder.clone(),
            initiator_type: self.initiator_type,
            responder_type: self.responder_type,
            model_info: self.model_info.clone(),
            metadata: inner.metadata.clone(),
            created_at: inner.created_at,
            last_activity: inner.last_activity,
            turns: inner.turns.clone(),
            rate_limit: inner.rate_limit.clone(),
        };
        serde_json::to_value(snapshot).expect("ConversationSnapshot is always serializable")
    }

    pub fn from_dict(value: Value) -> StingerResult<Conversation> {
        let snapshot: ConversationSnapshot = serde_json::from_value(value)?;
        Ok(Conversation {
            conversation_id: snapshot.conversation_id,
            initiator: snapshot.initiator,
            responder: snapshot.responder,
            initiator_type: snapshot.initiator_type,
            responder_type: snapshot.responder_type,
            model_info: snapshot.model_info,
            inner: Mutex::new(Inner {
                metadata: snapshot.metadata,
                created_at: snapshot.created_at,
                last_activity: snapshot.last_activity,
                turns: snapshot.turns,
                rate_limit: snapshot.rate_limit,
                rate_limit_turns: VecDeque::new(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_prompt_then_response_completes_last_turn() {
        let conv = Conversation::human_ai("u", "m").build();
        conv.add_prompt("hello", None);
        let turn = conv.add_response("hi there").unwrap();

        assert_eq!(turn.prompt, "hello");
        assert_eq!(turn.response.as_deref(), Some("hi there"));
        assert!(turn.is_complete());
        assert_eq!(conv.get_incomplete_turns().len(), 0);
    }

    #[test]
    fn add_response_without_incomplete_turn_fails() {
        let conv = Conversation::human_ai("u", "m").build();
        let err = conv.add_response("hi").unwrap_err();
        assert!(matches!(err, StingerError::IllegalState(_)));
    }

    #[test]
    fn add_exchange_is_atomic() {
        let conv = Conversation::human_ai("u", "m").build();
        conv.add_exchange("q", "a", None);
        assert_eq!(conv.get_turn_count(), 1);
        assert_eq!(conv.get_complete_turn_count(), 1);
    }

    #[test]
    fn conversation_rate_limit_trips_and_resets() {
        let conv = Conversation::human_ai("u", "m")
            .rate_limit(BTreeMap::from([("turns_per_minute".to_string(), 2)]))
            .build();

        conv.add_prompt("a", None);
        conv.add_prompt("b", None);
        conv.add_prompt("c", None);

        assert!(conv.check_rate_limit(RateLimitAction::Silent));
        conv.reset_rate_limit();
        assert!(!conv.check_rate_limit(RateLimitAction::Silent));
    }

    #[test]
    fn non_positive_limit_is_always_exceeded() {
        let conv = Conversation::human_ai("u", "m")
            .rate_limit(BTreeMap::from([("turns_per_minute".to_string(), 0)]))
            .build();
        assert!(conv.check_rate_limit(RateLimitAction::Silent));
    }

    #[test]
    fn to_dict_from_dict_round_trips() {
        let conv = Conversation::human_ai("u", "m")
            .conversation_id("fixed-id")
            .metadata(BTreeMap::from([("k".to_string(), Value::from("v"))]))
            .rate_limit(BTreeMap::from([("turns_per_minute".to_string(), 5)]))
            .build();
        conv.add_exchange("q1", "a1", None);
        conv.add_prompt("q2", None);

        let restored = Conversation::from_dict(conv.to_dict()).unwrap();

        assert_eq!(restored.conversation_id, conv.conversation_id);
        assert_eq!(restored.initiator, conv.initiator);
        assert_eq!(restored.responder, conv.responder);
        assert_eq!(restored.initiator_type, conv.initiator_type);
        assert_eq!(restored.responder_type, conv.responder_type);
        assert_eq!(restored.model_info, conv.model_info);
        assert_eq!(restored.metadata(), conv.metadata());
        assert_eq!(restored.rate_limit(), conv.rate_limit());
        assert_eq!(restored.get_turn_count(), conv.get_turn_count());
    }

    #[test]
    fn get_history_respects_limit() {
        let conv = Conversation::human_ai("u", "m").build();
        for i in 0..5 {
            conv.add_exchange(format!("q{i}"), format!("a{i}"), None);
        }
        let last_two = conv.get_history(Some(2));
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[1].prompt, "q4");
    }
}
