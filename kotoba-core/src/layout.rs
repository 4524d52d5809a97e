//! Identity → remote URL / local file name mapping.
//!
//! Both mappings are pure. For [`AudioLayout`] the file name is
//! `<prefix>W_<number>.mp3`; since a prefix never contains `_`, the file name
//! can be split back into `(prefix, number)` and no two identities share one.
//! URL path segments are percent-encoded, so `#`, `?` or `%` in a prefix stay
//! part of that identity's path.
//!
//! Injectivity holds byte-for-byte. Identities that differ only in letter
//! case (`a1-1`, `A1-1`) map to names that collide on case-insensitive
//! filesystems such as the macOS and Windows defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ConfigError;
use crate::types::ResourceIdentity;

/// Directories between the catalog origin and the per-prefix directory.
pub const AUDIO_PATH_SEGMENTS: [&str; 3] = ["res", "keyword", "audio"];
pub const AUDIO_EXTENSION: &str = ".mp3";

/// Mapping from a [`ResourceIdentity`] to where it lives remotely and locally.
pub trait AssetLayout: fmt::Debug + Send + Sync {
    /// Absolute URL of the asset.
    fn remote_url(&self, identity: &ResourceIdentity) -> Result<Url, ConfigError>;

    /// File name of the asset inside the mirror directory.
    fn file_name(&self, identity: &ResourceIdentity) -> String;

    /// `<base_dir>/<file_name>`: pure, no I/O.
    fn local_path(&self, base_dir: &Path, identity: &ResourceIdentity) -> PathBuf {
        base_dir.join(self.file_name(identity))
    }
}

/// Layout of the vocabulary audio files on the catalog host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLayout {
    base_url: String,
}

impl AudioLayout {
    /// `base_url` is the catalog origin, e.g. `https://words.marugotoweb.jp`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl AssetLayout for AudioLayout {
    /// `<base_url>/res/keyword/audio/<prefix>W/<prefix>W_<number>.mp3`
    fn remote_url(&self, identity: &ResourceIdentity) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.base_url).map_err(|source| ConfigError::Url {
            identity: identity.to_string(),
            source,
        })?;
        let directory = format!("{}W", identity.prefix());
        let file_name = audio_file_name(identity);
        url.path_segments_mut()
            .map_err(|()| ConfigError::Invalid {
                field: "base_url",
                reason: format!("'{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(AUDIO_PATH_SEGMENTS)
            .extend([directory.as_str(), file_name.as_str()]);
        Ok(url)
    }

    fn file_name(&self, identity: &ResourceIdentity) -> String {
        audio_file_name(identity)
    }
}

/// `<prefix>W_<number>.mp3`: shared by the mirror and the word export's
/// `[sound:...]` field.
pub fn audio_file_name(identity: &ResourceIdentity) -> String {
    format!("{}{AUDIO_EXTENSION}", audio_stem(identity))
}

fn audio_stem(identity: &ResourceIdentity) -> String {
    format!("{}W_{}", identity.prefix(), identity.number())
}
