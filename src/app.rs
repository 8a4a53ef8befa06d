use crate::catalog::CatalogLoader;
use crate::constants::{env, network};
use crate::errors::ConfigError;
use crate::managers::Dispatcher;
use crate::services::logger::{LogLevel, Logger};
use crate::services::transport::{HttpSettings, ReqwestTransport, TransportError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Process settings. Environment first, then explicit overrides from the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub services_path: PathBuf,
    pub http: HttpSettings,
    pub log_level: Option<LogLevel>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            services_path: resolve_services_path(),
            http: HttpSettings {
                connect_timeout: resolve_timeout(
                    env::CONNECT_TIMEOUT_MS,
                    network::TIMEOUT_CONNECT_MS,
                ),
                request_timeout: resolve_timeout(
                    env::REQUEST_TIMEOUT_MS,
                    network::TIMEOUT_REQUEST_MS,
                ),
            },
            log_level: None,
        }
    }

    pub fn logger(&self) -> Logger {
        let logger = Logger::new("restmcp");
        match self.log_level {
            Some(level) => logger.with_level(level),
            None => logger,
        }
    }
}

fn resolve_services_path() -> PathBuf {
    [env::SERVICES_XML, env::SERVICES_XML_LEGACY]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::DEFAULT_SERVICES_XML))
}

fn resolve_timeout(key: &str, fallback_ms: u64) -> Duration {
    let millis = std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(fallback_ms);
    Duration::from_millis(millis)
}

pub struct App {
    pub logger: Logger,
    pub dispatcher: Arc<Dispatcher>,
}

impl App {
    /// Loads the catalog and builds the HTTP client. A catalog that fails to
    /// load aborts startup.
    pub fn initialize(config: &AppConfig) -> Result<Self, AppError> {
        let logger = config.logger();
        let loader = CatalogLoader::new(logger.clone());
        let catalog = match loader.load_from_path(&config.services_path) {
            Ok(catalog) => catalog,
            Err(err) => {
                logger.error(
                    "Cannot load service catalog",
                    Some(&serde_json::json!({
                        "path": config.services_path.display().to_string(),
                        "error": err.to_string(),
                    })),
                );
                return Err(err.into());
            }
        };

        let transport = Arc::new(ReqwestTransport::new(config.http)?);
        let dispatcher = Dispatcher::new(catalog, transport, config.http, logger.clone())
            .with_source(&config.services_path);

        Ok(Self {
            logger,
            dispatcher: Arc::new(dispatcher),
        })
    }
}
