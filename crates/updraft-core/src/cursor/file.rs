//! File-backed cursor, the on-disk stand-in for browser local storage.
//!
//! The cursor lives in a small JSON document:
//!
//! ```json
//! {"since": 1718000000, "updated_at": "2024-06-10T06:13:20Z"}
//! ```
//!
//! Readers take a shared advisory lock on a sibling `.lock` file, writers
//! an exclusive one. Writes go to a temporary file that is renamed over
//! the real one, so readers never observe a half-written cursor.

use super::{CursorError, CursorStore};
use crate::lock::{CursorLock, DEFAULT_LOCK_TIMEOUT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct CursorDocument {
    since: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FileCursor {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileCursor {
    /// Cursor stored at `path`, locked through `<path>.lock`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self {
            path,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Delete the stored cursor. Returns whether a cursor existed.
    ///
    /// # Errors
    ///
    /// Fails when the lock cannot be taken or the file cannot be removed.
    pub fn reset(&self) -> Result<bool, CursorError> {
        let _lock = CursorLock::exclusive(&self.lock_path, self.lock_timeout)?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cursor reset");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.write_error(source)),
        }
    }

    fn write_error(&self, source: io::Error) -> CursorError {
        CursorError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl CursorStore for FileCursor {
    fn since(&self) -> Result<Option<i64>, CursorError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let _lock = CursorLock::shared(&self.lock_path, self.lock_timeout)?;
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CursorError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let doc: CursorDocument =
            serde_json::from_str(&content).map_err(|source| CursorError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(doc.since))
    }

    fn update_since(&mut self, secs: i64) -> Result<(), CursorError> {
        let _lock = CursorLock::exclusive(&self.lock_path, self.lock_timeout)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }

        let doc = CursorDocument {
            since: secs,
            updated_at: Some(Utc::now()),
        };
        let body = serde_json::to_vec_pretty(&doc)
            .map_err(|e| self.write_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        fs::write(&tmp_path, body).map_err(|source| self.write_error(source))?;
        if let Err(source) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.write_error(source));
        }

        tracing::debug!(path = %self.path.display(), since = secs, "cursor persisted");
        Ok(())
    }
}
