//! The tracked-changes aggregator.
//!
//! [`TrackedChanges`] is what a feed view owns: upstream events go in
//! through [`TrackedChanges::add_change`], and each refresh reads the
//! newest `target_count` entries through
//! [`TrackedChanges::changes_to_render`]. When more changes are tracked
//! than fit, the time of the last shown change becomes the new "since"
//! cursor so the next fetch only asks for newer events.
//!
//! Single owner, single thread: wrap it in a mutex if it must be shared.

use super::key::ChangeKey;
use super::queue::PresentationQueue;
use super::store::{DEFAULT_SAMPLE_CAP, MergeOutcome, MergeStore};
use crate::change::Change;
use crate::cursor::CursorStore;
use crate::profile::{HexJsonProfileDecoder, ProfileDecoder};
use tracing::instrument;

/// Default number of changes shown per render.
pub const DEFAULT_TARGET_COUNT: usize = 10;

/// Sizing knobs for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    /// Changes returned per render. Zero is treated as one.
    pub target_count: usize,
    /// Contributors kept by name on a merged change. Zero is treated as one.
    pub sample_cap: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }
}

pub struct TrackedChanges<C, D = HexJsonProfileDecoder> {
    store: MergeStore,
    queue: PresentationQueue,
    cursor: C,
    decoder: D,
    target_count: usize,
}

impl<C: CursorStore> TrackedChanges<C> {
    /// Feed with default sizing and the hex/JSON profile decoder.
    pub fn new(cursor: C) -> Self {
        Self::with_options(cursor, HexJsonProfileDecoder, FeedOptions::default())
    }
}

impl<C: CursorStore, D: ProfileDecoder> TrackedChanges<C, D> {
    pub fn with_options(cursor: C, decoder: D, options: FeedOptions) -> Self {
        Self {
            store: MergeStore::new(options.sample_cap),
            queue: PresentationQueue::new(),
            cursor,
            decoder,
            target_count: options.target_count.max(1),
        }
    }

    /// Track one upstream change.
    #[instrument(level = "trace", skip_all, fields(kind = change.type_tag(), time = change.time()))]
    pub fn add_change(&mut self, change: Change) -> MergeOutcome {
        self.store.add(change, &mut self.queue, &self.decoder)
    }

    /// Track a batch of changes in order.
    pub fn extend<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = Change>,
    {
        for change in changes {
            self.add_change(change);
        }
    }

    /// The newest `target_count` changes, most recent first.
    ///
    /// When more changes are tracked than that, the cursor is moved to the
    /// time (in seconds) of the last change returned. A cursor that cannot
    /// be written is logged and otherwise ignored.
    pub fn changes_to_render(&mut self) -> Vec<Change> {
        self.keyed_changes_to_render()
            .into_iter()
            .map(|(_, change)| change)
            .collect()
    }

    /// Same as [`Self::changes_to_render`], paired with the key each change
    /// is stored under.
    #[instrument(level = "debug", skip(self), fields(tracked = self.store.len()))]
    pub fn keyed_changes_to_render(&mut self) -> Vec<(ChangeKey, Change)> {
        let mut changes: Vec<(ChangeKey, Change)> = self
            .queue
            .to_sorted()
            .into_iter()
            .filter_map(|entry| {
                let change = self.store.get(&entry.key);
                if change.is_none() {
                    tracing::warn!(key = %entry.key, "queued change missing from store");
                }
                change.map(|c| (entry.key.clone(), c.clone()))
            })
            .collect();

        if changes.len() <= self.target_count {
            return changes;
        }

        changes.truncate(self.target_count);
        if let Some((_, last)) = changes.last() {
            let since = last.time().div_euclid(1000);
            match self.cursor.update_since(since) {
                Ok(()) => tracing::debug!(since, "advanced since cursor"),
                Err(e) => tracing::warn!(code = %e.code(), "failed to advance since cursor: {e}"),
            }
        }
        changes
    }

    /// Look up a tracked change by key.
    #[must_use]
    pub fn get(&self, key: &ChangeKey) -> Option<&Change> {
        self.store.get(key)
    }

    /// Forget every tracked change. The cursor is left alone.
    pub fn clear(&mut self) {
        self.store.clear();
        let drained = self.queue.drain().len();
        tracing::debug!(drained, "cleared tracked changes");
    }

    /// Number of distinct tracked changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    #[must_use]
    pub const fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Give back the cursor store, dropping all tracked state.
    pub fn into_cursor(self) -> C {
        self.cursor
    }
}

impl<C, D> std::fmt::Debug for TrackedChanges<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedChanges")
            .field("tracked", &self.store.len())
            .field("queued", &self.queue.len())
            .field("target_count", &self.target_count)
            .finish_non_exhaustive()
    }
}
