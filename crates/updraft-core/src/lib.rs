//! updraft-core library.
//!
//! Aggregates the Updraft activity feed: upstream changes about ideas and
//! solutions are deduplicated by identity, supporter/funder bursts are
//! folded into one entry, and renders return the newest entries while
//! advancing the "since" cursor.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums carrying an [`error::ErrorCode`];
//!   the feed façade itself never fails.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod change;
pub mod config;
pub mod cursor;
pub mod error;
pub mod feed;
pub mod lock;
pub mod profile;

pub use change::{Change, ChangeKind, Contributor};
pub use cursor::{CursorStore, FileCursor, MemoryCursor};
pub use feed::{ChangeKey, FeedOptions, TrackedChanges};
