//! Where audit records get written, and the smart defaults used when the
//! caller doesn't specify (spec §4.6).

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => write!(f, "stdout"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Destination {
    pub fn parse(raw: &str) -> Self {
        if raw == "stdout" {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(raw))
        }
    }
}

/// `true` when `STINGER_ENV=production`. Anything else (including unset)
/// is treated as development, matching the original implementation's
/// environment-based smart defaults.
pub fn is_production() -> bool {
    std::env::var("STINGER_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

/// `(destination, redact_pii)` used when `enable()` is called with no
/// explicit destination.
pub fn smart_defaults() -> (Destination, bool) {
    if is_production() {
        (Destination::File(PathBuf::from("./audit.log")), true)
    } else {
        (Destination::Stdout, false)
    }
}
