use crate::constants::network::{TIMEOUT_CONNECT_MS, TIMEOUT_REQUEST_MS, USER_AGENT};
use crate::services::invocation::InvocationRequest;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(TIMEOUT_CONNECT_MS),
            request_timeout: Duration::from_millis(TIMEOUT_REQUEST_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Failure before a response was received. The variant names the cause class.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("connection refused/failed: {0}")]
    Connect(String),
    #[error("dns resolution failed: {0}")]
    Dns(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Other(String),
}

/// One attempt, no retries. Implementations must give up once the configured
/// timeout elapses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &InvocationRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: HttpSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::Other(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &InvocationRequest,
    ) -> Result<TransportResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("bad method {}", request.method)))?;
        let full_url = request.full_url();
        let url = Url::parse(&full_url).map_err(|err| {
            TransportError::InvalidRequest(format!("bad url {}: {}", full_url, err))
        })?;
        let headers = to_header_map(&request.headers)?;

        let mut req = self.client.request(method, url).headers(headers);
        if let Some(body) = &request.body {
            req = req.json(&Value::Object(body.clone()));
        }

        let response = req.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        Ok(TransportResponse { status, body })
    }
}

fn to_header_map(
    headers: &std::collections::BTreeMap<String, String>,
) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("bad header name {}", key)))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidRequest(format!("bad value for header {}", key)))?;
        map.insert(name, val);
    }
    Ok(map)
}

pub fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    let detail = error_chain(&err);
    if err.is_timeout() {
        return TransportError::Timeout(detail);
    }
    if err.is_builder() {
        return TransportError::InvalidRequest(detail);
    }
    if err.is_connect() {
        let lowered = detail.to_lowercase();
        if lowered.contains("dns") || lowered.contains("failed to lookup address") {
            return TransportError::Dns(detail);
        }
        return TransportError::Connect(detail);
    }
    TransportError::Other(detail)
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}
