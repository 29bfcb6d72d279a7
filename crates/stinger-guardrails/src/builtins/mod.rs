//! A handful of concrete, intentionally simple guardrails used to exercise
//! the pipeline's fusion rules and the presets — not the specification's
//! focus (see crate-level docs).

pub mod keyword;
pub mod length;
pub mod pii;
pub mod url;

pub use keyword::KeywordGuardrail;
pub use length::LengthGuardrail;
pub use pii::PiiGuardrail;
pub use url::UrlGuardrail;
