//! Local mirror writer.
//!
//! ## `commit`: 5-step protocol
//!
//! 1. Create the parent directory (idempotent).
//! 2. Write the bytes to `<path>.kotoba.tmp`.
//! 3. Stamp the temp file's mtime (and atime) with the remote `Last-Modified`.
//! 4. Rename to the final path (atomic on POSIX; the stamp travels with it).
//! 5. On any failure remove the temp file.
//!
//! The final path therefore only ever holds a complete file that already
//! carries its remote timestamp, so an interrupted run can never leave behind
//! something the freshness oracle would accept.

use std::path::{Path, PathBuf};

use filetime::FileTime;

use kotoba_core::RemoteDescriptor;

use crate::error::{io_err, SyncError};

pub const TMP_SUFFIX: &str = ".kotoba.tmp";

/// `<path>.kotoba.tmp`, next to the target so the rename never crosses filesystems.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Persist `bytes` at `path` and stamp it with `descriptor.last_modified`.
pub fn commit(path: &Path, bytes: &[u8], descriptor: &RemoteDescriptor) -> Result<(), SyncError> {
    commit_with_tmp(path, bytes, descriptor, &tmp_path_for(path))
}

fn commit_with_tmp(
    path: &Path,
    bytes: &[u8],
    descriptor: &RemoteDescriptor,
    tmp: &Path,
) -> Result<(), SyncError> {
    // Step 1: parent directories. `create_dir_all` tolerates concurrent creators.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    // Steps 2–3: write and stamp the temp file.
    let result = write_stamped(tmp, bytes, descriptor);
    if let Err(err) = result {
        let _ = std::fs::remove_file(tmp);
        return Err(err);
    }

    // Step 4: atomic rename to final path.
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "committed");
    Ok(())
}

fn write_stamped(tmp: &Path, bytes: &[u8], descriptor: &RemoteDescriptor) -> Result<(), SyncError> {
    std::fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;
    let stamp = file_time(descriptor);
    filetime::set_file_times(tmp, stamp, stamp).map_err(|e| io_err(tmp, e))
}

fn file_time(descriptor: &RemoteDescriptor) -> FileTime {
    let at = descriptor.last_modified;
    FileTime::from_unix_time(at.timestamp(), at.timestamp_subsec_nanos())
}
