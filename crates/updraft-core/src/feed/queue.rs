//! Time-ordered presentation queue.
//!
//! Holds one entry per enqueued change and yields them most recent first.
//! Entries live in a vector that is sorted on read. An entry whose time
//! changed is removed by predicate and enqueued again.
//!
//! Ties on `time` are broken by insertion order, earlier first.

use super::key::ChangeKey;
use crate::change::{Change, ChangeKind};
use std::cmp::Reverse;

/// A queued reference to a stored change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Key of the change in the merge store.
    pub key: ChangeKey,
    pub kind: Option<ChangeKind>,
    /// Id of the idea or solution the change is about.
    pub subject: Option<String>,
    /// Event time in Unix milliseconds.
    pub time: i64,
    seq: u64,
}

impl QueueEntry {
    /// Structural match: same change kind about the same entity.
    ///
    /// Unrecognized changes never match anything.
    #[must_use]
    pub fn matches(&self, change: &Change) -> bool {
        self.kind.is_some()
            && self.kind == change.kind()
            && self.subject.as_deref() == change.subject_id()
    }
}

#[derive(Debug, Default)]
pub struct PresentationQueue {
    entries: Vec<QueueEntry>,
    next_seq: u64,
}

impl PresentationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry for `change`, stored under `key`.
    pub fn enqueue(&mut self, key: ChangeKey, change: &Change) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(QueueEntry {
            key,
            kind: change.kind(),
            subject: change.subject_id().map(str::to_string),
            time: change.time(),
            seq,
        });
    }

    /// Remove the first entry (in insertion order) matching `predicate`.
    pub fn remove<P>(&mut self, mut predicate: P) -> Option<QueueEntry>
    where
        P: FnMut(&QueueEntry) -> bool,
    {
        let idx = self.entries.iter().position(&mut predicate)?;
        Some(self.entries.remove(idx))
    }

    /// Snapshot of all entries, most recent first.
    #[must_use]
    pub fn to_sorted(&self) -> Vec<&QueueEntry> {
        let mut sorted: Vec<&QueueEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| (Reverse(entry.time), entry.seq));
        sorted
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, returning them in insertion order.
    pub fn drain(&mut self) -> Vec<QueueEntry> {
        std::mem::take(&mut self.entries)
    }
}
