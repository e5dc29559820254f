//! Atomic snapshot write and checked read
//!
//! Writes go to a temp file in the same directory followed by a rename, so a
//! crash mid-write leaves the previous snapshot intact. Reads validate the
//! header and the payload checksum before any record is materialized.

use lodestone_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use crate::format::StoreSnapshot;

/// Write a snapshot atomically to `path`
///
/// The previous file content survives any failure before the final rename.
pub fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let bytes = snapshot.encode()?;

    let tmp_path = temp_path(path);
    let mut file = fs::File::create(&tmp_path).map_err(|e| Error::FileError {
        path: tmp_path.clone(),
        message: format!("could not create temp snapshot: {}", e),
    })?;
    if let Err(e) = file.write_all(&bytes).and_then(|_| file.sync_all()) {
        // best effort: do not leave a half-written temp file behind
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::FileError {
            path: tmp_path,
            message: format!("could not write snapshot: {}", e),
        });
    }
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::FileError {
            path: path.to_path_buf(),
            message: format!("could not move snapshot into place: {}", e),
        }
    })?;

    debug!(path = %path.display(), records = snapshot.records.len(), "snapshot written");
    Ok(())
}

/// Read and validate the snapshot at `path`
pub fn read_snapshot(path: &Path) -> Result<StoreSnapshot> {
    let bytes = fs::read(path).map_err(|e| Error::FileError {
        path: path.to_path_buf(),
        message: format!("could not read store file: {}", e),
    })?;
    match StoreSnapshot::decode(&bytes) {
        Ok(snapshot) => {
            debug!(path = %path.display(), records = snapshot.records.len(), "snapshot read");
            Ok(snapshot)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot failed validation");
            Err(e)
        }
    }
}

fn temp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(".tmp");
    path.with_file_name(name)
}
