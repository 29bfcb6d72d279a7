//! Shared data model and error types for the Stinger guardrail engine.
//!
//! This crate has no behavior of its own: it defines the vocabulary
//! (`GuardrailResult`, `PipelineResult`, `PipelineConfig`, error types) that
//! every other `stinger-*` crate builds on, the same role `lr-types` plays
//! in the teacher workspace.

pub mod config;
pub mod errors;
pub mod result;
pub mod stage;

pub use config::{GuardrailConfig, PipelineConfig, StagesConfig};
pub use errors::{GuardrailError, StingerError, StingerResult};
pub use result::{GuardrailResult, PipelineResult};
pub use stage::{OnError, PipelineStage, StageSelector};
