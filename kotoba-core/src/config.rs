//! Mirror configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.kotoba/
//!   config.yaml   (mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function that touches the home directory has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! `load_from` / `save_to` take the config file path directly (`--config`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{io_err, ConfigError};
use crate::layout::AudioLayout;
use crate::types::{LanguageId, LevelId};

pub const DEFAULT_BASE_URL: &str = "https://words.marugotoweb.jp";
pub const BASE_NAME: &str = "MARUGOTO-NO-KOTOBA";
pub const WORDS_DIR: &str = "words";
pub const MEDIA_DIR: &str = "media";

/// Upper bound for `concurrency_limit`.
pub const MAX_CONCURRENCY: usize = 1024;

const DEFAULT_LEVELS: [&str; 3] = ["A1", "A2-1", "A2-2"];
const DEFAULT_LANGUAGES: [&str; 7] = ["en", "es", "id", "th", "zh", "vi", "fr"];

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Everything a mirror run needs to know; replaces module-level constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Catalog origin; the search API and the audio files live under it.
    pub base_url: String,
    /// Root under which `words/` and `media/` are written.
    pub output_dir: PathBuf,
    pub levels: Vec<LevelId>,
    pub languages: Vec<LanguageId>,
    /// Maximum number of simultaneous asset fetches.
    pub concurrency_limit: usize,
    pub request_timeout_secs: u64,
    /// Allowed distance between local and remote mtimes, in whole seconds.
    pub mtime_tolerance_secs: u64,
    /// Extra rounds for retryable failures (0 = no retry).
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            output_dir: PathBuf::from("."),
            levels: DEFAULT_LEVELS.iter().map(|l| LevelId::from(*l)).collect(),
            languages: DEFAULT_LANGUAGES
                .iter()
                .map(|l| LanguageId::from(*l))
                .collect(),
            concurrency_limit: 8,
            request_timeout_secs: 30,
            mtime_tolerance_secs: 0,
            retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl MirrorConfig {
    /// Reject values no run could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency_limit",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.concurrency_limit > MAX_CONCURRENCY {
            return Err(ConfigError::Invalid {
                field: "concurrency_limit",
                reason: format!("must be at most {MAX_CONCURRENCY}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid {
                field: "levels",
                reason: "at least one level is required".to_owned(),
            });
        }
        if self.languages.is_empty() {
            return Err(ConfigError::Invalid {
                field: "languages",
                reason: "at least one language is required".to_owned(),
            });
        }
        if let Err(err) = Url::parse(&self.base_url) {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn mtime_tolerance(&self) -> Duration {
        Duration::from_secs(self.mtime_tolerance_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Layout of the audio assets under [`Self::base_url`].
    pub fn audio_layout(&self) -> AudioLayout {
        AudioLayout::new(self.base_url.as_str())
    }

    /// `<base_url>/SearchCategoryAPI`
    pub fn words_api_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("{}/SearchCategoryAPI", self.base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|err| ConfigError::Invalid {
            field: "base_url",
            reason: err.to_string(),
        })
    }

    /// `<output_dir>/words/`
    pub fn words_dir(&self) -> PathBuf {
        self.output_dir.join(WORDS_DIR)
    }

    /// `<output_dir>/words/MARUGOTO-NO-KOTOBA-<language>-<level>.csv`
    pub fn words_csv_path(&self, language: &LanguageId, level: &LevelId) -> PathBuf {
        self.words_dir()
            .join(format!("{BASE_NAME}-{language}-{level}.csv"))
    }

    /// `<output_dir>/media/MARUGOTO-NO-KOTOBA-<level>/`
    pub fn media_dir(&self, level: &LevelId) -> PathBuf {
        self.output_dir
            .join(MEDIA_DIR)
            .join(format!("{BASE_NAME}-{level}"))
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.kotoba/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".kotoba").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns defaults if the file does not exist;
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<MirrorConfig, ConfigError> {
    if !path.exists() {
        return Ok(MirrorConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: MirrorConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.kotoba/config.yaml`.
pub fn load_at(home: &Path) -> Result<MirrorConfig, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<MirrorConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save `config` to `path`.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_to(path: &Path, config: &MirrorConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid config path")));
    };
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Save to `<home>/.kotoba/config.yaml`.
pub fn save_at(home: &Path, config: &MirrorConfig) -> Result<(), ConfigError> {
    save_to(&config_path_at(home), config)
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Write `config` to `path` unless a file is already there (or `force`).
pub fn init_to(path: &Path, config: &MirrorConfig, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_to(path, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
