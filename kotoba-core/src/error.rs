//! Error types for kotoba-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration and identity handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A config value failed validation.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A catalog raw id that does not have the `<prefix>-<digits>` shape.
    #[error("invalid resource identity '{0}'")]
    InvalidIdentity(String),

    /// A remote URL could not be built for an identity.
    #[error("cannot build URL for '{identity}': {source}")]
    Url {
        identity: String,
        #[source]
        source: url::ParseError,
    },

    /// Config file already exists and overwrite was not requested.
    #[error("config already exists at {path}")]
    AlreadyExists { path: PathBuf },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.kotoba/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
