use serde::Serialize;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchErrorKind {
    UnknownService,
    MissingRequiredParameters,
    UnsupportedMethod,
    InvalidRequest,
    NetworkError,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_service(service: &str) -> Self {
        Self::new(
            DispatchErrorKind::UnknownService,
            format!("Service '{}' is not defined in the catalog", service),
        )
    }

    pub fn missing_required(service: &str, missing: &[String]) -> Self {
        Self::new(
            DispatchErrorKind::MissingRequiredParameters,
            format!(
                "Missing required parameters for service '{}': {}",
                service,
                missing.join(", ")
            ),
        )
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            DispatchErrorKind::UnsupportedMethod,
            format!("HTTP method '{}' is not supported", method),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::InvalidRequest, message)
    }

    pub fn network(service: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            DispatchErrorKind::NetworkError,
            format!("Network error calling service '{}': {}", service, cause),
        )
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for DispatchError {}
