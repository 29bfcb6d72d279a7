//! PII redaction applied to audit content fields (spec §4.6, §9 resolved
//! Open Question 3). The token set is part of the public contract so
//! downstream tooling can interpret redacted fields.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_TOKEN: &str = "[EMAIL_REDACTED]";
pub const PHONE_TOKEN: &str = "[PHONE_REDACTED]";
pub const SSN_TOKEN: &str = "[SSN_REDACTED]";
pub const CREDIT_CARD_TOKEN: &str = "[CREDIT_CARD_REDACTED]";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b").unwrap());
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static CREDIT_CARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap());

/// Replace recognized PII patterns with their frozen redaction tokens.
///
/// Order matters: SSNs are a stricter subset of the credit-card pattern's
/// shape, so SSNs are redacted first.
pub fn redact(text: &str) -> String {
    let text = SSN_RE.replace_all(text, SSN_TOKEN);
    let text = EMAIL_RE.replace_all(&text, EMAIL_TOKEN);
    let text = PHONE_RE.replace_all(&text, PHONE_TOKEN);
    let text = CREDIT_CARD_RE.replace_all(&text, CREDIT_CARD_TOKEN);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email() {
        assert_eq!(redact("contact me at a@b.com"), "contact me at [EMAIL_REDACTED]");
    }

    #[test]
    fn redacts_ssn_before_credit_card_pattern_consumes_it() {
        assert_eq!(redact("ssn is 123-45-6789"), "ssn is [SSN_REDACTED]");
    }

    #[test]
    fn redacts_phone() {
        assert_eq!(redact("call 555-123-4567"), "call [PHONE_REDACTED]");
    }

    #[test]
    fn leaves_unrecognized_text_untouched() {
        assert_eq!(redact("hello world"), "hello world");
    }
}
