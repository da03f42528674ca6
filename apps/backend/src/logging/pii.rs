//! PII redaction for log output.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::unwrap_used)]
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap());

/// Base64/JWT-like runs of 16+ characters
#[allow(clippy::unwrap_used)]
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9+/_.-]{16,}={0,2}").unwrap());

/// Masks emails (first character of the local part kept, domain kept) and
/// opaque tokens. Emails go first so their domains are never mistaken for
/// tokens.
pub fn redact(input: &str) -> String {
    let masked = EMAIL.replace_all(input, |caps: &regex::Captures| {
        let full = &caps[0];
        match full.split_once('@') {
            Some((local, domain)) => match local.chars().next() {
                Some(first) => format!("{first}***@{domain}"),
                None => format!("@{domain}"),
            },
            None => full.to_string(),
        }
    });
    TOKEN.replace_all(&masked, "[REDACTED_TOKEN]").into_owned()
}

/// First four characters of an external subject, the rest masked.
pub fn redact_sub(sub: &str) -> String {
    let visible: String = sub.chars().take(4).collect();
    if visible.len() == sub.len() {
        "*".repeat(sub.chars().count())
    } else {
        format!("{visible}***")
    }
}

/// Display wrapper that applies [`redact`].
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
