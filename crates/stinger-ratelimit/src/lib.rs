//! Process-wide global rate limiter (spec §4.4).
//!
//! Orthogonal to conversation-level limits: this gates callers by an opaque
//! principal key (typically a hashed API key), independent of any
//! conversation the caller happens to be in.

pub mod limiter;
pub mod window;

pub use limiter::{default_limits, CheckResult, GlobalRateLimiter, StatusResponse, WindowStatus};

use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<GlobalRateLimiter> = OnceCell::new();

/// The process-wide singleton. Lazily initialized with default limits on
/// first access.
pub fn get_global_rate_limiter() -> &'static GlobalRateLimiter {
    GLOBAL.get_or_init(GlobalRateLimiter::new)
}
