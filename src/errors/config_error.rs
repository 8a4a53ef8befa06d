use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a catalog. Fatal at startup; a running dispatcher keeps
/// its previous catalog when a reload fails with one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service catalog not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read service catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse service catalog: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("root element must be <RestServices>, found <{0}>")]
    InvalidRoot(String),
    #[error("attribute baseUrl is missing or empty on <RestServices>")]
    MissingBaseUrl,
    #[error("dispatcher has no catalog source to reload from")]
    NoSource,
}
