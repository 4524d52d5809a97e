//! Error types for kotoba-catalog.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use kotoba_core::ConfigError;

/// All errors that can arise from listing the catalog or exporting words.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The search API answered with a non-success status.
    #[error("HTTP {status} for URL: {url}")]
    Http { status: u16, url: Url },

    /// Connection-level failure talking to the search API.
    #[error("transport error for {url}: {message}")]
    Transport { url: Url, message: String },

    /// The response body was not the expected JSON shape.
    #[error("cannot decode catalog response from {url}: {message}")]
    Decode { url: Url, message: String },

    /// Filesystem error while writing an export.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience constructor for [`CatalogError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CatalogError {
    CatalogError::Io {
        path: path.into(),
        source,
    }
}
