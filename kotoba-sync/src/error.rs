//! Error types for kotoba-sync.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use kotoba_core::ConfigError;

/// Errors the Asset Fetcher can signal for one identity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The remote answered with a non-success status (404 for a removed asset).
    #[error("HTTP {status} for URL: {url}")]
    Http { status: u16, url: Url },

    /// Connection-level failure: DNS, timeout, reset, truncated body.
    #[error("transport error for {url}: {message}")]
    Transport { url: Url, message: String },

    /// A header the descriptor is built from was absent.
    #[error("response for {url} has no {header} header")]
    MissingHeader { url: Url, header: &'static str },

    /// A header the descriptor is built from could not be interpreted.
    #[error("response for {url} has unparsable {header} header: {value:?}")]
    InvalidHeader {
        url: Url,
        header: &'static str,
        value: String,
    },

    /// No URL could be derived for the identity.
    #[error("cannot derive URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether re-issuing the same request later could plausibly succeed.
    ///
    /// Transport failures and 5xx / 408 / 429 are retryable; other 4xx and
    /// malformed responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            FetchError::MissingHeader { .. }
            | FetchError::InvalidHeader { .. }
            | FetchError::InvalidUrl(_) => false,
        }
    }

    /// HTTP status if this is [`FetchError::Http`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn transport(url: &Url, err: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            url: url.clone(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for FetchError {
    fn from(err: ConfigError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

/// Errors raised by the local side of a sync: the mirror writer and the
/// HTTP client setup.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Configuration problem (invalid URL, bad limits).
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
