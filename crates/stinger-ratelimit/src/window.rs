//! The three window names the global rate limiter recognizes (spec §4.4).

use chrono::Duration;

pub const REQUESTS_PER_MINUTE: &str = "requests_per_minute";
pub const REQUESTS_PER_HOUR: &str = "requests_per_hour";
pub const REQUESTS_PER_DAY: &str = "requests_per_day";

pub fn duration_for(window: &str) -> Option<Duration> {
    match window {
        REQUESTS_PER_MINUTE => Some(Duration::minutes(1)),
        REQUESTS_PER_HOUR => Some(Duration::hours(1)),
        REQUESTS_PER_DAY => Some(Duration::days(1)),
        _ => None,
    }
}

/// The longest window among a limit map, used to bound an event queue's
/// memory footprint.
pub fn longest(limits: &std::collections::BTreeMap<String, i64>) -> Duration {
    limits
        .keys()
        .filter_map(|name| duration_for(name))
        .max()
        .unwrap_or_else(|| Duration::seconds(0))
}
