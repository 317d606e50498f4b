//! Advisory locks guarding the persisted cursor.
//!
//! A cursor stored at `since.json` is guarded by `since.json.lock`. Readers
//! share the lock, writers hold it alone. The lock is released when the
//! guard drops.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Default wait before giving up on a contended cursor lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_START: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(
        "{}: timed out after {:?} waiting for {}",
        ErrorCode::LockContention,
        .waited,
        .path.display()
    )]
    Timeout { path: PathBuf, waited: Duration },
    #[error(
        "{}: cannot lock {}: {}",
        ErrorCode::CursorWriteFailed,
        .path.display(),
        .source
    )]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io { .. } => ErrorCode::CursorWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Held advisory lock on a cursor's lock file.
#[derive(Debug)]
pub struct CursorLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl CursorLock {
    /// Take the lock for reading.
    ///
    /// # Errors
    ///
    /// Times out while a writer holds the lock for longer than `timeout`.
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Shared, timeout)
    }

    /// Take the lock for writing.
    ///
    /// # Errors
    ///
    /// Times out while any other holder keeps the lock for longer than
    /// `timeout`.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, LockMode::Exclusive, timeout)
    }

    /// Create the lock file if needed and poll until it is locked in `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] when the lock file cannot be opened and
    /// [`LockError::Timeout`] when contention outlasts `timeout`.
    pub fn acquire(path: &Path, mode: LockMode, timeout: Duration) -> Result<Self, LockError> {
        let io_err = |source: io::Error| LockError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let start = Instant::now();
        let mut backoff = POLL_START;
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match attempt {
                Ok(()) => {
                    tracing::trace!(path = %path.display(), ?mode, "cursor lock acquired");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                        mode,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.raw_os_error() == contended => {}
                Err(source) => return Err(io_err(source)),
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(backoff.min(timeout.saturating_sub(waited)));
            backoff = (backoff * 2).min(POLL_MAX);
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for CursorLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
