//! Process-wide sliding-window rate limiter keyed by an opaque principal
//! key (spec §4.4). Orthogonal to the per-conversation limiter in
//! `stinger-conversation`: this one gates API callers, not conversation
//! participants.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::window::{self, REQUESTS_PER_DAY, REQUESTS_PER_HOUR, REQUESTS_PER_MINUTE};

/// Default limits applied to a key the first time it is seen.
pub fn default_limits() -> BTreeMap<String, i64> {
    BTreeMap::from([
        (REQUESTS_PER_MINUTE.to_string(), 60),
        (REQUESTS_PER_HOUR.to_string(), 1000),
        (REQUESTS_PER_DAY.to_string(), 10_000),
    ])
}

/// Per-window status returned by `get_status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowStatus {
    pub current: i64,
    pub limit: i64,
    pub remaining: i64,
    pub reset_time: Option<DateTime<Utc>>,
}

/// Response of `get_status`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatusResponse {
    pub details: BTreeMap<String, WindowStatus>,
}

/// Verdict returned by `check_rate_limit`. The limiter never raises; this is
/// the structured result callers translate into HTTP 429 or equivalent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckResult {
    pub exceeded: bool,
    pub exceeded_limits: Vec<String>,
    pub remaining: BTreeMap<String, i64>,
    pub limit: BTreeMap<String, i64>,
    pub reason: Option<String>,
}

struct KeyState {
    events: VecDeque<DateTime<Utc>>,
    limits: BTreeMap<String, i64>,
}

impl KeyState {
    fn new(limits: BTreeMap<String, i64>) -> Self {
        Self {
            events: VecDeque::new(),
            limits,
        }
    }

    fn evict(&mut self) {
        let window = window::longest(&self.limits);
        if window <= chrono::Duration::seconds(0) {
            return;
        }
        let cutoff = Utc::now() - window;
        while let Some(front) = self.events.front() {
            if *front < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// The global rate limiter. One internal map shards locking per key
/// (`DashMap`); each key's sliding-window state is additionally guarded by
/// its own mutex so concurrent callers on different keys never contend.
pub struct GlobalRateLimiter {
    states: DashMap<String, Mutex<KeyState>>,
    defaults: Mutex<BTreeMap<String, i64>>,
}

impl Default for GlobalRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalRateLimiter {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
            defaults: Mutex::new(default_limits()),
        }
    }

    fn entry_limits(&self) -> BTreeMap<String, i64> {
        self.defaults.lock().clone()
    }

    /// `for each configured window of length W, count events newer than
    /// now − W` (spec §4.4). `override_limits`, if given, is used for this
    /// call only and is not persisted against the key.
    pub fn check_rate_limit(
        &self,
        key: &str,
        override_limits: Option<&BTreeMap<String, i64>>,
    ) -> CheckResult {
        let state = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(KeyState::new(self.entry_limits())));
        let mut state = state.lock();
        state.evict();

        let limits = override_limits
            .cloned()
            .unwrap_or_else(|| state.limits.clone());

        let now = Utc::now();
        let mut exceeded_limits = Vec::new();
        let mut remaining = BTreeMap::new();
        let mut limit_map = BTreeMap::new();

        for (name, &limit) in &limits {
            let Some(duration) = window::duration_for(name) else {
                continue;
            };
            let cutoff = now - duration;
            let current = state.events.iter().filter(|t| **t >= cutoff).count() as i64;
            limit_map.insert(name.clone(), limit);
            remaining.insert(name.clone(), (limit - current).max(0));
            if limit <= 0 || current >= limit {
                exceeded_limits.push(name.clone());
            }
        }

        let exceeded = !exceeded_limits.is_empty();
        let reason = exceeded.then(|| format!("rate limit exceeded for window(s): {}", exceeded_limits.join(", ")));

        if exceeded {
            tracing::warn!(key = %key, windows = ?exceeded_limits, "global rate limit exceeded");
        }

        CheckResult {
            exceeded,
            exceeded_limits,
            remaining,
            limit: limit_map,
            reason,
        }
    }

    /// Append-only: callers record usage after a successful (not-exceeded)
    /// check.
    pub fn record_request(&self, key: &str) {
        let state = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(KeyState::new(self.entry_limits())));
        let mut state = state.lock();
        state.events.push_back(Utc::now());
        state.evict();
    }

    pub fn get_status(&self, key: &str) -> StatusResponse {
        let Some(state) = self.states.get(key) else {
            let limits = self.entry_limits();
            let details = limits
                .into_iter()
                .map(|(name, limit)| {
                    (
                        name,
                        WindowStatus {
                            current: 0,
                            limit,
                            remaining: limit,
                            reset_time: None,
                        },
                    )
                })
                .collect();
            return StatusResponse { details };
        };
        let mut state = state.lock();
        state.evict();
        let now = Utc::now();

        let details = state
            .limits
            .iter()
            .filter_map(|(name, &limit)| {
                let duration = window::duration_for(name)?;
                let cutoff = now - duration;
                let in_window: Vec<&DateTime<Utc>> =
                    state.events.iter().filter(|t| **t >= cutoff).collect();
                let current = in_window.len() as i64;
                let reset_time = in_window.iter().min().map(|&&t| t + duration);
                Some((
                    name.clone(),
                    WindowStatus {
                        current,
                        limit,
                        remaining: (limit - current).max(0),
                        reset_time,
                    },
                ))
            })
            .collect();

        StatusResponse { details }
    }

    /// Clears state for one key; the next check/record re-snapshots the
    /// current defaults.
    pub fn reset_limits(&self, key: &str) {
        self.states.remove(key);
    }

    /// Mutates defaults for subsequently seen keys; keys already tracked
    /// keep the limits they were stamped with.
    pub fn set_default_limits(&self, limits: BTreeMap<String, i64>) {
        *self.defaults.lock() = limits;
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.states.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_key_is_not_exceeded_and_reports_full_remaining() {
        let limiter = GlobalRateLimiter::new();
        let result = limiter.check_rate_limit("k1", None);
        assert!(!result.exceeded);
        assert_eq!(result.remaining[REQUESTS_PER_MINUTE], 60);
    }

    #[test]
    fn exceeding_minute_limit_flags_that_window_only() {
        let limiter = GlobalRateLimiter::new();
        limiter.set_default_limits(BTreeMap::from([(REQUESTS_PER_MINUTE.to_string(), 2)]));
        limiter.record_request("k2");
        limiter.record_request("k2");
        let result = limiter.check_rate_limit("k2", None);
        assert!(result.exceeded);
        assert_eq!(result.exceeded_limits, vec![REQUESTS_PER_MINUTE.to_string()]);
    }

    #[test]
    fn record_request_increments_current_by_exactly_one() {
        let limiter = GlobalRateLimiter::new();
        let before = limiter.get_status("k3").details[REQUESTS_PER_MINUTE].current;
        limiter.record_request("k3");
        let after = limiter.get_status("k3").details[REQUESTS_PER_MINUTE].current;
        assert_eq!(after, before + 1);
    }

    #[test]
    fn reset_limits_clears_tracked_key() {
        let limiter = GlobalRateLimiter::new();
        limiter.record_request("k4");
        assert!(limiter.get_all_keys().contains(&"k4".to_string()));
        limiter.reset_limits("k4");
        assert!(!limiter.get_all_keys().contains(&"k4".to_string()));
    }

    #[test]
    fn override_limits_do_not_persist() {
        let limiter = GlobalRateLimiter::new();
        let tight = BTreeMap::from([(REQUESTS_PER_MINUTE.to_string(), 0)]);
        let result = limiter.check_rate_limit("k5", Some(&tight));
        assert!(result.exceeded);

        let result = limiter.check_rate_limit("k5", None);
        assert!(!result.exceeded);
    }

    #[test]
    fn keys_seen_before_default_change_keep_old_limits() {
        let limiter = GlobalRateLimiter::new();
        limiter.record_request("early");
        limiter.set_default_limits(BTreeMap::from([(REQUESTS_PER_MINUTE.to_string(), 1)]));
        let status = limiter.get_status("early");
        assert_eq!(status.details[REQUESTS_PER_MINUTE].limit, 60);

        let status = limiter.get_status("late");
        assert_eq!(status.details[REQUESTS_PER_MINUTE].limit, 1);
    }
}
