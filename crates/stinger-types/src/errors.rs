//! Error types and conversions shared across the engine.

use thiserror::Error;

/// Errors raised by guardrail construction, registration, and lookup.
#[derive(Error, Debug)]
pub enum GuardrailError {
    #[error("unknown guardrail type: {0}")]
    InvalidGuardrailType(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

/// Top-level error type for the engine core.
#[derive(Error, Debug)]
pub enum StingerError {
    #[error("guardrail error: {0}")]
    Guardrail(#[from] GuardrailError),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StingerResult<T> = Result<T, StingerError>;

impl From<StingerError> for String {
    fn from(err: StingerError) -> String {
        err.to_string()
    }
}
