//! Multi-participant conversation/turn model with per-conversation
//! sliding-window rate limiting.
//!
//! This mirrors the role the teacher workspace splits between its
//! session/state trackers: an ordered, mutex-guarded turn log plus a
//! sliding-window rate limiter, but scoped to a single conversation rather
//! than a process-wide key.

pub mod conversation;
pub mod rate_limit;
pub mod turn;

pub use conversation::{Conversation, ConversationBuilder, ParticipantType};
pub use rate_limit::RateLimitAction;
pub use turn::Turn;
