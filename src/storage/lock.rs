// FILE: src/storage/lock.rs
//! Advisory lock around a load-modify-save cycle on one state file.
//!
//! Narrows (does not close) the race between separate invocations touching
//! the same key. Only unix hosts take a real lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use anyhow::Result;

pub struct StateLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

impl StateLock {
    /// Block until an exclusive lock on `path` is held.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Cannot open lock file {}: {}", path.display(), e))?;

        Self::lock_exclusive(&file, path)?;
        tracing::debug!("[StateLock] Acquired {}", path.display());

        Ok(Self { path: path.to_path_buf(), file })
    }

    #[cfg(unix)]
    fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
        use std::os::unix::io::AsRawFd;

        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if result == 0 {
            Ok(())
        } else {
            let err = std::io::Error::last_os_error();
            Err(anyhow::anyhow!("flock failed on {}: {}", path.display(), err))
        }
    }

    #[cfg(not(unix))]
    fn lock_exclusive(_file: &File, _path: &Path) -> Result<()> {
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the flock.
        tracing::debug!("[StateLock] Released {}", self.path.display());
    }
}
