use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

pub const REDACTED: &str = "***REDACTED***";

static SENSITIVE_HEADERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "cookie",
        "x-api-key",
        "x-auth-token",
        "x-access-token",
    ]
    .into_iter()
    .collect()
});

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer|Basic)\s+([A-Za-z0-9._~+/=-]{6,})")
                .expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            REDACTED,
        ),
        (
            Regex::new(r"\bsk-[A-Za-z0-9_-]{10,}\b").expect("inline redaction regex"),
            "sk-***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_header(name: &str) -> bool {
    let normalized = name.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if SENSITIVE_HEADERS.contains(normalized.as_str()) {
        return true;
    }
    ["token", "secret", "password"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name) {
                REDACTED.to_string()
            } else {
                redact_inline(value)
            };
            (name.clone(), shown)
        })
        .collect()
}

/// Masks credential-looking substrings in free text (log previews, rendered commands).
pub fn redact_inline(value: &str) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    out
}
