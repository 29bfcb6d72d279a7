//! The guardrail trait contract, registry/factory, and a small set of
//! built-in guardrails (spec §4.1, §4.2).

pub mod action;
pub mod builtins;
pub mod guardrail;
pub mod registry;

pub use action::DetectionAction;
pub use builtins::{KeywordGuardrail, LengthGuardrail, PiiGuardrail, UrlGuardrail};
pub use guardrail::Guardrail;
pub use registry::{get_global_registry, GuardrailConstructor, GuardrailRegistry};
