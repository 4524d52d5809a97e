//! Domain types for the kotoba mirror.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A catalog level identifier (e.g. `A1`, `A2-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub String);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LevelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LevelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A translation language identifier used by the catalog (`en`, `fr`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageId(pub String);

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LanguageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LanguageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// ResourceIdentity
// ---------------------------------------------------------------------------

/// Key of one remote asset: a catalog raw id of the form `<prefix>-<digits>`.
///
/// The prefix is non-empty and never contains `_`, `/` or `\`, which keeps
/// the derived file names unique and inside the mirror directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentity {
    raw: String,
    split: usize,
}

impl ResourceIdentity {
    /// Validate a catalog raw id.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidIdentity(raw.to_owned());
        let (prefix, number) = raw.rsplit_once('-').ok_or_else(invalid)?;
        if prefix.is_empty() || prefix.contains(['_', '/', '\\']) {
            return Err(invalid());
        }
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        Ok(Self {
            raw: raw.to_owned(),
            split: prefix.len(),
        })
    }

    /// The id exactly as the catalog reported it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Everything before the final `-`.
    pub fn prefix(&self) -> &str {
        &self.raw[..self.split]
    }

    /// The digit run after the final `-`, leading zeros preserved.
    pub fn number(&self) -> &str {
        &self.raw[self.split + 1..]
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

impl FromStr for ResourceIdentity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// RemoteDescriptor
// ---------------------------------------------------------------------------

/// Size and modification time of a remote asset, captured from one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteDescriptor {
    pub byte_len: u64,
    pub last_modified: DateTime<Utc>,
}

impl RemoteDescriptor {
    pub fn new(byte_len: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            byte_len,
            last_modified,
        }
    }
}

/// Parse a `Last-Modified` header value (IMF-fixdate / RFC 2822).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
