//! Per-conversation sliding-window turn rate limiting (spec §4.3).

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

/// What `check_rate_limit` should do when a limit is currently exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitAction {
    Raise,
    Warn,
    Log,
    #[default]
    Silent,
}

/// The two window names the spec recognizes for conversation-level limits.
fn window_duration(name: &str) -> Option<Duration> {
    match name {
        "turns_per_minute" => Some(Duration::minutes(1)),
        "turns_per_hour" => Some(Duration::hours(1)),
        _ => None,
    }
}

/// Longest window among a rate-limit config, used to bound
/// `rate_limit_turns`'s memory footprint.
pub fn longest_window(rate_limit: &BTreeMap<String, i64>) -> Duration {
    rate_limit
        .keys()
        .filter_map(|name| window_duration(name))
        .max()
        .unwrap_or_else(|| Duration::seconds(0))
}

/// Evict events older than the longest configured window.
pub fn evict(events: &mut VecDeque<DateTime<Utc>>, rate_limit: &BTreeMap<String, i64>) {
    let window = longest_window(rate_limit);
    if window <= Duration::seconds(0) {
        return;
    }
    let cutoff = Utc::now() - window;
    while let Some(front) = events.front() {
        if *front < cutoff {
            events.pop_front();
        } else {
            break;
        }
    }
}

/// `true` iff any configured window is currently exceeded by `events`.
///
/// A limit value `<= 0` is treated as "always exceeded" (useful for test
/// fixtures, per spec §4.3).
pub fn is_exceeded(events: &VecDeque<DateTime<Utc>>, rate_limit: &BTreeMap<String, i64>) -> bool {
    let now = Utc::now();
    for (name, limit) in rate_limit {
        if *limit <= 0 {
            return true;
        }
        let Some(window) = window_duration(name) else {
            continue;
        };
        let cutoff = now - window;
        let count = events.iter().filter(|t| **t >= cutoff).count();
        if count as i64 >= *limit {
            return true;
        }
    }
    false
}
