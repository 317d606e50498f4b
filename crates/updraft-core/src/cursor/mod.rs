//! The "since" cursor: a Unix-seconds watermark telling the upstream fetch
//! which events it has already shown.
//!
//! The aggregator only ever writes the cursor (when a render truncates the
//! feed); the upstream fetch layer reads it to bound its next query.
//! Stores are injected so the aggregator can run without any persistent
//! storage.

pub mod file;

pub use file::FileCursor;

use crate::error::ErrorCode;
use crate::lock::LockError;
use std::io;
use std::path::PathBuf;

/// Failure reading or writing a cursor.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("failed to read cursor at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cursor at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cursor file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl CursorError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Corrupt { .. } => ErrorCode::CursorReadFailed,
            Self::Write { .. } => ErrorCode::CursorWriteFailed,
            Self::Lock(e) => e.code(),
        }
    }
}

/// Persistent home of the "since" watermark.
pub trait CursorStore {
    /// Current watermark in Unix seconds, `None` when never set.
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] when the backing storage cannot be read.
    fn since(&self) -> Result<Option<i64>, CursorError>;

    /// Replace the watermark.
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] when the backing storage cannot be written.
    fn update_since(&mut self, secs: i64) -> Result<(), CursorError>;
}

impl<C: CursorStore + ?Sized> CursorStore for &mut C {
    fn since(&self) -> Result<Option<i64>, CursorError> {
        (**self).since()
    }

    fn update_since(&mut self, secs: i64) -> Result<(), CursorError> {
        (**self).update_since(secs)
    }
}

impl<C: CursorStore + ?Sized> CursorStore for Box<C> {
    fn since(&self) -> Result<Option<i64>, CursorError> {
        (**self).since()
    }

    fn update_since(&mut self, secs: i64) -> Result<(), CursorError> {
        (**self).update_since(secs)
    }
}

/// In-process cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCursor {
    since: Option<i64>,
    updates: usize,
}

impl MemoryCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor already holding `secs`.
    #[must_use]
    pub const fn starting_at(secs: i64) -> Self {
        Self {
            since: Some(secs),
            updates: 0,
        }
    }

    /// Current value, without going through the fallible trait method.
    #[must_use]
    pub const fn get(&self) -> Option<i64> {
        self.since
    }

    /// Number of times [`CursorStore::update_since`] was called.
    #[must_use]
    pub const fn updates(&self) -> usize {
        self.updates
    }
}

impl CursorStore for MemoryCursor {
    fn since(&self) -> Result<Option<i64>, CursorError> {
        Ok(self.since)
    }

    fn update_since(&mut self, secs: i64) -> Result<(), CursorError> {
        self.since = Some(secs);
        self.updates += 1;
        Ok(())
    }
}

/// Cursor backed by a caller-supplied `get`/`set` pair, e.g. an
/// application-level settings signal.
pub struct CallbackCursor<G, S> {
    get: G,
    set: S,
}

impl<G, S> CallbackCursor<G, S>
where
    G: Fn() -> Option<i64>,
    S: FnMut(i64),
{
    pub const fn new(get: G, set: S) -> Self {
        Self { get, set }
    }
}

impl<G, S> CursorStore for CallbackCursor<G, S>
where
    G: Fn() -> Option<i64>,
    S: FnMut(i64),
{
    fn since(&self) -> Result<Option<i64>, CursorError> {
        Ok((self.get)())
    }

    fn update_since(&mut self, secs: i64) -> Result<(), CursorError> {
        (self.set)(secs);
        Ok(())
    }
}

impl<G, S> std::fmt::Debug for CallbackCursor<G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCursor").finish_non_exhaustive()
    }
}
