//! Mutation lock
//!
//! Exclusive, non-blocking advisory lock on a sidecar file. Every mutation
//! opens a fresh descriptor and calls `flock(LOCK_EX | LOCK_NB)`, so two
//! threads of one process contend exactly like two processes do. The lock is
//! released when the guard is dropped.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{LineKvError, Result};

/// Held exclusive lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
}

impl FileLock {
    /// Try to take the lock without waiting
    ///
    /// Returns `LockBusy` if any other holder (thread or process) owns it.
    pub fn try_acquire(path: &Path) -> Result<Self> {
        let file = Self::acquire_os(path)?;

        tracing::trace!(path = %path.display(), "Lock acquired");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn acquire_os(path: &Path) -> Result<File> {
        use std::os::unix::io::AsRawFd;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // SAFETY: flock operates on a descriptor obtained from a live File
        // that outlives the call.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(file);
        }

        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            Err(LineKvError::LockBusy {
                path: path.to_path_buf(),
            })
        } else {
            Err(LineKvError::Io(err))
        }
    }

    #[cfg(not(unix))]
    fn acquire_os(path: &Path) -> Result<File> {
        // Exclusive create stands in for flock: whoever creates the file
        // holds the lock until the guard removes it.
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(LineKvError::LockBusy {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(LineKvError::Io(e)),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: the descriptor is still owned by self.file here.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = std::fs::remove_file(&self.path);
        }

        tracing::trace!(path = %self.path.display(), "Lock released");
    }
}
