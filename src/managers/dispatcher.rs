use crate::catalog::{describe_catalog, Catalog, CatalogLoader, ServiceDescriptor, ServiceSpec};
use crate::constants::limits::LOG_PREVIEW_CHARS;
use crate::errors::{ConfigError, DispatchError};
use crate::services::argument_binder::bind_arguments;
use crate::services::header_resolver::resolve_headers;
use crate::services::invocation::{InvocationRequest, InvocationResult, RequestEcho};
use crate::services::logger::Logger;
use crate::services::transport::{HttpSettings, HttpTransport, TransportError};
use crate::utils::curl::render_curl;
use crate::utils::redact::redact_inline;
use crate::utils::text::{preview, preview_json};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

// Slack on top of the transport timeout so the transport reports its own,
// more specific, timeout error first.
const DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// Turns `(service_name, arguments)` into one HTTP call against the catalog.
///
/// The catalog is held behind an `Arc` and swapped whole on reload, so a call
/// always sees a single consistent snapshot. Calls share no other state and
/// can run concurrently.
pub struct Dispatcher {
    logger: Logger,
    catalog: RwLock<Arc<Catalog>>,
    source: Option<PathBuf>,
    loader: CatalogLoader,
    transport: Arc<dyn HttpTransport>,
    deadline: Duration,
}

impl Dispatcher {
    pub fn new(
        catalog: Catalog,
        transport: Arc<dyn HttpTransport>,
        settings: HttpSettings,
        logger: Logger,
    ) -> Self {
        Self {
            loader: CatalogLoader::new(logger.clone()),
            logger: logger.child("dispatcher"),
            catalog: RwLock::new(Arc::new(catalog)),
            source: None,
            transport,
            deadline: settings.request_timeout + DEADLINE_GRACE,
        }
    }

    /// Remembers where the catalog came from so [`Dispatcher::reload`] can re-read it.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.catalog.read().unwrap_or_else(|err| err.into_inner());
        guard.clone()
    }

    pub fn replace_catalog(&self, catalog: Catalog) {
        let mut guard = self.catalog.write().unwrap_or_else(|err| err.into_inner());
        *guard = Arc::new(catalog);
    }

    /// Re-reads the source document and swaps it in. On failure the current
    /// catalog stays active.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let path = self.source.as_ref().ok_or(ConfigError::NoSource)?;
        let catalog = match self.loader.load_from_path(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                self.logger.error(
                    "Catalog reload failed, keeping the current catalog",
                    Some(&json!({ "error": err.to_string() })),
                );
                return Err(err);
            }
        };
        let count = catalog.len();
        self.replace_catalog(catalog);
        self.logger
            .info("Catalog reloaded", Some(&json!({ "services": count })));
        Ok(count)
    }

    pub fn list_services(&self) -> Vec<ServiceDescriptor> {
        describe_catalog(&self.snapshot())
    }

    /// Never fails: every problem comes back as a result with `ok == false`.
    pub async fn invoke(
        &self,
        service_name: &str,
        arguments: &Map<String, Value>,
    ) -> InvocationResult {
        let catalog = self.snapshot();
        let call_id = uuid::Uuid::new_v4().simple().to_string();
        let logger = self.logger.child(&call_id[..8]);
        let arguments_preview = preview_json(&Value::Object(arguments.clone()), LOG_PREVIEW_CHARS);
        logger.info(
            "Invoking service",
            Some(&json!({
                "service": service_name,
                "arguments": redact_inline(&arguments_preview),
            })),
        );

        let Some(service) = catalog.get(service_name) else {
            let err = DispatchError::unknown_service(service_name);
            logger.error(&err.message, None);
            return InvocationResult::failure(service_name, err, None);
        };

        let missing = service.missing_required(arguments);
        if !missing.is_empty() {
            let err = DispatchError::missing_required(service_name, &missing);
            logger.warn(&err.message, None);
            return InvocationResult::failure(service_name, err, None);
        }

        let request = build_request(service, catalog.base_url(), arguments);
        let echo_request = request.redacted();
        let curl = render_curl(&echo_request);
        logger.info("Equivalent request", Some(&json!({ "curl": curl })));
        let echo = RequestEcho {
            request: echo_request,
            curl,
        };

        if !service.method.is_supported() {
            let err = DispatchError::unsupported_method(service.method.as_str());
            logger.error(&err.message, None);
            return InvocationResult::failure(service_name, err, Some(echo));
        }

        let started = Instant::now();
        let sent = tokio::time::timeout(self.deadline, self.transport.send(&request)).await;
        let outcome = match sent {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(format!(
                "no response within {} ms",
                self.deadline.as_millis()
            ))),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                let result = InvocationResult::from_response(
                    service_name,
                    echo,
                    response.status,
                    response.body,
                    duration_ms,
                );
                let body_preview = match (&result.response_json, &result.response_text) {
                    (Some(parsed), _) => preview_json(parsed, LOG_PREVIEW_CHARS),
                    (None, Some(text)) => preview(text, LOG_PREVIEW_CHARS),
                    (None, None) => String::new(),
                };
                let meta = json!({
                    "status": response.status,
                    "duration_ms": duration_ms,
                    "body": redact_inline(&body_preview),
                });
                if result.ok {
                    logger.info("Response received", Some(&meta));
                } else {
                    logger.warn("Service answered with a non-2xx status", Some(&meta));
                }
                result
            }
            Err(TransportError::InvalidRequest(detail)) => {
                let err = DispatchError::invalid_request(format!(
                    "Cannot build request for service '{}': {}",
                    service_name, detail
                ));
                logger.error(&err.message, None);
                InvocationResult::failure(service_name, err, Some(echo))
            }
            Err(other) => {
                let err = DispatchError::network(service_name, other);
                logger.error(&err.message, Some(&json!({ "duration_ms": duration_ms })));
                let mut result = InvocationResult::failure(service_name, err, Some(echo));
                result.duration_ms = Some(duration_ms);
                result
            }
        }
    }
}

fn build_request(
    service: &ServiceSpec,
    global_base_url: &str,
    arguments: &Map<String, Value>,
) -> InvocationRequest {
    let bound = bind_arguments(service, service.base_url(global_base_url), arguments);
    InvocationRequest {
        method: service.method.as_str().to_string(),
        url: bound.url,
        query: bound.query,
        body: (!bound.body.is_empty()).then_some(bound.body),
        headers: resolve_headers(&service.headers),
    }
}
