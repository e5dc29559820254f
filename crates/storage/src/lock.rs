//! Process-wide store path registry
//!
//! At most one live `Store` may exist per path. The registry is the unit of
//! mutual exclusion across open attempts: a second `open` on a path that is
//! already held fails instead of silently producing two independent stores
//! over one file. `delete` consults the registry as well.
//!
//! Paths are keyed exactly as given by the caller; cross-process locking is
//! out of scope (single-process access model).

use lodestone_core::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

static OPEN_PATHS: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Exclusive hold on a store path; released on drop
#[derive(Debug)]
pub struct PathLock {
    path: PathBuf,
}

impl PathLock {
    /// Acquire the exclusive lock for `path`
    ///
    /// Fails with `FileError` if another live store already holds it.
    pub fn acquire(path: &Path) -> Result<PathLock> {
        let key = path.to_path_buf();
        let mut open = OPEN_PATHS.lock();
        if !open.insert(key.clone()) {
            return Err(Error::FileError {
                path: key,
                message: "store is already open at this path".to_string(),
            });
        }
        Ok(PathLock { path: key })
    }

    /// Path this lock holds
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        OPEN_PATHS.lock().remove(&self.path);
    }
}

/// Whether a live store currently holds `path`
pub fn is_locked(path: &Path) -> bool {
    OPEN_PATHS.lock().contains(path)
}
