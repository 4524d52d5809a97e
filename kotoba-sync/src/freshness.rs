//! Freshness oracle: is the local copy of an asset still current?
//!
//! A local file is fresh iff it is a regular file whose byte size equals the
//! remote `Content-Length` and whose mtime equals the remote `Last-Modified`.
//! Size and timestamp together stand in for a content fingerprint; nothing is
//! hashed.
//!
//! Timestamps are compared at whole-second resolution because HTTP dates
//! carry nothing finer. `tolerance` widens the accepted distance for
//! filesystems that store coarser mtimes (FAT keeps 2 s); the default is
//! zero, i.e. exact second equality.

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use kotoba_core::RemoteDescriptor;

/// Size and mtime of a local file, read once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStamp {
    pub byte_len: u64,
    pub modified: SystemTime,
}

impl LocalStamp {
    /// Stat `path`.
    ///
    /// Returns `Ok(None)` when nothing is there or the entry is not a regular
    /// file.
    pub fn read(path: &Path) -> std::io::Result<Option<Self>> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        if !meta.is_file() {
            return Ok(None);
        }
        Ok(Some(Self {
            byte_len: meta.len(),
            modified: meta.modified()?,
        }))
    }

    pub fn modified_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.modified)
    }
}

/// Oracle verdict for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale(StaleReason),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Why a local copy was judged stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    Missing,
    SizeMismatch {
        local: u64,
        remote: u64,
    },
    ModifiedMismatch {
        local: DateTime<Utc>,
        remote: DateTime<Utc>,
    },
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::Missing => f.write_str("no local copy"),
            StaleReason::SizeMismatch { local, remote } => {
                write!(f, "size {local} != remote {remote}")
            }
            StaleReason::ModifiedMismatch { local, remote } => {
                write!(f, "mtime {} != remote {}", local.to_rfc3339(), remote.to_rfc3339())
            }
        }
    }
}

/// Compare an already-read local stamp against a remote descriptor. Pure.
pub fn check(
    local: Option<&LocalStamp>,
    remote: &RemoteDescriptor,
    tolerance: Duration,
) -> Freshness {
    let Some(local) = local else {
        return Freshness::Stale(StaleReason::Missing);
    };
    if local.byte_len != remote.byte_len {
        return Freshness::Stale(StaleReason::SizeMismatch {
            local: local.byte_len,
            remote: remote.byte_len,
        });
    }
    let local_modified = local.modified_utc();
    let distance = local_modified
        .timestamp()
        .abs_diff(remote.last_modified.timestamp());
    if distance > tolerance.as_secs() {
        return Freshness::Stale(StaleReason::ModifiedMismatch {
            local: local_modified,
            remote: remote.last_modified,
        });
    }
    Freshness::Fresh
}

/// `true` iff the file at `local_path` matches `remote` exactly (to the second).
pub fn is_fresh(local_path: &Path, remote: &RemoteDescriptor) -> bool {
    is_fresh_within(local_path, remote, Duration::ZERO)
}

/// [`is_fresh`] with an mtime tolerance. An unreadable path counts as stale.
pub fn is_fresh_within(local_path: &Path, remote: &RemoteDescriptor, tolerance: Duration) -> bool {
    match LocalStamp::read(local_path) {
        Ok(stamp) => check(stamp.as_ref(), remote, tolerance).is_fresh(),
        Err(err) => {
            tracing::debug!(path = %local_path.display(), error = %err, "stat failed; treating as stale");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn remote(len: u64, secs: i64) -> RemoteDescriptor {
        RemoteDescriptor::new(len, Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn stamp(len: u64, secs: u64, nanos: u32) -> LocalStamp {
        LocalStamp {
            byte_len: len,
            modified: SystemTime::UNIX_EPOCH + Duration::new(secs, nanos),
        }
    }

    #[test]
    fn missing_is_stale() {
        let verdict = check(None, &remote(10, 1_000), Duration::ZERO);
        assert_eq!(verdict, Freshness::Stale(StaleReason::Missing));
    }

    #[test]
    fn size_mismatch_is_stale_even_with_matching_mtime() {
        let verdict = check(Some(&stamp(9, 1_000, 0)), &remote(10, 1_000), Duration::ZERO);
        assert!(matches!(
            verdict,
            Freshness::Stale(StaleReason::SizeMismatch { local: 9, remote: 10 })
        ));
    }

    #[test]
    fn newer_local_mtime_is_still_stale() {
        let verdict = check(Some(&stamp(10, 2_000, 0)), &remote(10, 1_000), Duration::ZERO);
        assert!(matches!(
            verdict,
            Freshness::Stale(StaleReason::ModifiedMismatch { .. })
        ));
    }

    #[test]
    fn sub_second_local_precision_is_ignored() {
        let verdict = check(
            Some(&stamp(10, 1_000, 999_000_000)),
            &remote(10, 1_000),
            Duration::ZERO,
        );
        assert_eq!(verdict, Freshness::Fresh);
    }

    #[test]
    fn tolerance_absorbs_coarse_filesystems() {
        let local = stamp(10, 1_002, 0);
        assert!(!check(Some(&local), &remote(10, 1_000), Duration::ZERO).is_fresh());
        assert!(check(Some(&local), &remote(10, 1_000), Duration::from_secs(2)).is_fresh());
        assert!(check(Some(&local), &remote(10, 1_004), Duration::from_secs(2)).is_fresh());
    }

    #[test]
    fn directory_at_path_is_stale() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(LocalStamp::read(tmp.path()).unwrap().is_none());
        assert!(!is_fresh(tmp.path(), &remote(0, 0)));
    }
}
