//! Single-writer run lock
//!
//! Collection and migration both rewrite files under the data root. An
//! advisory lock on `{root}/.run.lock` keeps two overlapping runs from
//! interleaving their writes.

use super::StoreError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lock file name under the data root
pub const LOCK_FILE_NAME: &str = ".run.lock";

/// Advisory lock on the data root
///
/// The lock is held for as long as the guard returned by
/// [`RunLock::try_acquire`] lives.
pub struct RunLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl RunLock {
    /// Open (creating if needed) the lock file of a data root
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;

        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        Ok(Self {
            path,
            lock: RwLock::new(file),
        })
    }

    /// Lock file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive lock without blocking
    ///
    /// # Errors
    /// Returns [`StoreError::Locked`] if another process holds the lock.
    pub fn try_acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>, StoreError> {
        let path = self.path.clone();
        match self.lock.try_write() {
            Ok(guard) => {
                debug!(path = %path.display(), "Run lock acquired");
                Ok(guard)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(StoreError::Locked(path)),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}
