use crate::catalog::HeaderSpec;
use crate::constants::network::DEFAULT_ACCEPT;
use std::collections::BTreeMap;

/// Resolves declared headers against the process environment.
pub fn resolve_headers(headers: &[HeaderSpec]) -> BTreeMap<String, String> {
    resolve_headers_with(headers, |name| std::env::var(name).ok())
}

/// Resolution order per header: non-empty env var, then non-empty literal,
/// otherwise the header is dropped. Names compare case-insensitively and a
/// later declaration replaces an earlier one. `Accept: application/json` is
/// added when nothing else set `Accept`.
pub fn resolve_headers_with<F>(headers: &[HeaderSpec], lookup: F) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = BTreeMap::new();
    for header in headers {
        let from_env = header
            .env_var
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .and_then(|name| lookup(name.trim()))
            .filter(|value| !value.is_empty());
        let value = from_env.or_else(|| header.literal.clone().filter(|value| !value.is_empty()));
        if let Some(value) = value {
            insert_header(&mut resolved, &header.name, value);
        }
    }

    if !has_header(&resolved, "accept") {
        resolved.insert("Accept".to_string(), DEFAULT_ACCEPT.to_string());
    }
    resolved
}

pub fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

fn insert_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn header(name: &str, literal: Option<&str>, env_var: Option<&str>) -> HeaderSpec {
        HeaderSpec {
            name: name.to_string(),
            literal: literal.map(str::to_string),
            env_var: env_var.map(str::to_string),
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_value_wins_over_literal() {
        let headers = [header("X-Token", Some("fallback"), Some("TOKEN"))];
        let out = resolve_headers_with(&headers, env(&[("TOKEN", "abc")]));
        assert_eq!(out.get("X-Token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn literal_used_when_env_unset_or_empty() {
        let headers = [header("X-Token", Some("fallback"), Some("TOKEN"))];
        let out = resolve_headers_with(&headers, env(&[]));
        assert_eq!(out.get("X-Token").map(String::as_str), Some("fallback"));

        let out = resolve_headers_with(&headers, env(&[("TOKEN", "")]));
        assert_eq!(out.get("X-Token").map(String::as_str), Some("fallback"));
    }

    #[test]
    fn unresolvable_headers_are_omitted() {
        let headers = [
            header("X-Empty", Some(""), None),
            header("X-Missing", None, Some("NOPE")),
        ];
        let out = resolve_headers_with(&headers, env(&[]));
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("Accept"));
    }

    #[test]
    fn later_declaration_overwrites_earlier() {
        let headers = [
            header("X-Gruppo", Some("ONE"), None),
            header("x-gruppo", Some("TWO"), None),
            header("X-Gruppo", None, Some("UNSET")),
        ];
        let out = resolve_headers_with(&headers, env(&[]));
        assert_eq!(out.get("x-gruppo").map(String::as_str), Some("TWO"));
        assert!(!out.contains_key("X-Gruppo"));
    }

    #[test]
    fn explicit_accept_is_never_overridden() {
        let headers = [header("accept", Some("text/csv"), None)];
        let out = resolve_headers_with(&headers, env(&[]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("accept").map(String::as_str), Some("text/csv"));
    }

    #[test]
    fn default_accept_is_injected() {
        let out = resolve_headers_with(&[], env(&[]));
        assert_eq!(out.get("Accept").map(String::as_str), Some("application/json"));
    }
}
