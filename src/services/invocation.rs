use crate::errors::{DispatchError, DispatchErrorKind};
use crate::services::argument_binder::scalar_text;
use crate::utils::redact::redact_headers;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationRequest {
    pub method: String,
    pub url: String,
    pub query: Map<String, Value>,
    /// `None` when no body parameter was supplied; the request then carries no body.
    pub body: Option<Map<String, Value>>,
    pub headers: BTreeMap<String, String>,
}

impl InvocationRequest {
    /// Query map flattened into wire pairs. Arrays repeat the key, nulls are
    /// dropped, objects are sent as compact JSON.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items.iter().filter(|item| !item.is_null()) {
                        pairs.push((key.clone(), scalar_text(item)));
                    }
                }
                other => pairs.push((key.clone(), scalar_text(other))),
            }
        }
        pairs
    }

    /// URL including the encoded query string.
    pub fn full_url(&self) -> String {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return self.url.clone();
        }
        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            encoder.append_pair(key, value);
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, encoder.finish())
    }

    /// Copy safe to log or hand back to the caller.
    pub fn redacted(&self) -> Self {
        Self {
            headers: redact_headers(&self.headers),
            ..self.clone()
        }
    }
}

/// Request as echoed back in a result, with its equivalent command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEcho {
    #[serde(flatten)]
    pub request: InvocationRequest,
    pub curl: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub service: String,
    pub request: Option<RequestEcho>,
    pub response_json: Option<Value>,
    pub response_text: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<DispatchErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl InvocationResult {
    pub fn failure(service: &str, error: DispatchError, request: Option<RequestEcho>) -> Self {
        Self {
            ok: false,
            status_code: None,
            service: service.to_string(),
            request,
            response_json: None,
            response_text: None,
            error: Some(error.message),
            error_kind: Some(error.kind),
            duration_ms: None,
        }
    }

    /// Result for a received response. 2xx is success; anything else is
    /// reported as `HTTP <code>` with the body still attached.
    pub fn from_response(
        service: &str,
        request: RequestEcho,
        status: u16,
        body: String,
        duration_ms: u64,
    ) -> Self {
        let ok = (200..300).contains(&status);
        let (response_json, response_text) = match serde_json::from_str::<Value>(&body) {
            Ok(parsed) => (Some(parsed), None),
            Err(_) => (None, Some(body)),
        };
        Self {
            ok,
            status_code: Some(status),
            service: service.to_string(),
            request: Some(request),
            response_json,
            response_text,
            error: if ok { None } else { Some(format!("HTTP {}", status)) },
            error_kind: None,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: Value) -> InvocationRequest {
        InvocationRequest {
            method: "GET".to_string(),
            url: "http://localhost:8001/prices".to_string(),
            query: query.as_object().cloned().expect("object"),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    fn echo() -> RequestEcho {
        RequestEcho {
            request: request(json!({})),
            curl: "curl".to_string(),
        }
    }

    #[test]
    fn full_url_encodes_query_values() {
        let req = request(json!({
            "article_code": "mela rossa",
            "page": 2,
            "skip": null,
            "tag": ["a", "b"]
        }));
        assert_eq!(
            req.full_url(),
            "http://localhost:8001/prices?article_code=mela+rossa&page=2&tag=a&tag=b"
        );
        assert_eq!(request(json!({})).full_url(), "http://localhost:8001/prices");
    }

    #[test]
    fn json_body_is_parsed_on_http_failure() {
        let result = InvocationResult::from_response(
            "get_order",
            echo(),
            404,
            r#"{"detail":"Order not found"}"#.to_string(),
            3,
        );
        assert!(!result.ok);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
        assert_eq!(result.response_json, Some(json!({"detail": "Order not found"})));
        assert!(result.response_text.is_none());
        assert!(result.error_kind.is_none());
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        let result =
            InvocationResult::from_response("s", echo(), 201, "created".to_string(), 1);
        assert!(result.ok);
        assert!(result.error.is_none());
        assert!(result.response_json.is_none());
        assert_eq!(result.response_text.as_deref(), Some("created"));
    }

    #[test]
    fn failure_serializes_with_null_status() {
        let result =
            InvocationResult::failure("nope", DispatchError::unknown_service("nope"), None);
        let value = result.to_value();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["status_code"], Value::Null);
        assert_eq!(value["error_kind"], json!("unknown_service"));
        assert!(value.get("duration_ms").is_none());
    }
}
