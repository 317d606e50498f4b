//! Merge store: one materialized change per [`ChangeKey`].
//!
//! The first change seen for a key is authoritative. Later supporter or
//! funder changes for the same idea/solution fold into it: up to
//! `sample_cap` distinct contributors are kept by name, further distinct
//! contributors only bump `additional_count`. Repeats of any other kind
//! are dropped.
//!
//! Every insert is mirrored into the [`PresentationQueue`]. When a merge
//! moves a change's time forward its queue entry is removed and
//! re-enqueued so ordering stays correct.

use super::key::ChangeKey;
use super::queue::PresentationQueue;
use crate::change::{Change, Contributor};
use crate::profile::{ProfileDecoder, resolve_name};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Default number of contributors shown by name on a merged change.
pub const DEFAULT_SAMPLE_CAP: usize = 3;

/// What [`MergeStore::add`] did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First sighting; stored and enqueued.
    Inserted,
    /// Folded into an existing supporter/funder change.
    Merged { time_advanced: bool },
    /// Repeat of a non-mergeable change; dropped.
    Ignored,
}

#[derive(Debug)]
struct Tracked {
    change: Change,
    /// Addresses counted in `additional_count`, so repeats are not recounted.
    ///
    /// Grows with every distinct overflow contributor for this key and is
    /// only released by [`MergeStore::clear`].
    overflow: HashSet<String>,
}

#[derive(Debug)]
pub struct MergeStore {
    entries: HashMap<ChangeKey, Tracked>,
    sample_cap: usize,
}

impl Default for MergeStore {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAP)
    }
}

impl MergeStore {
    /// Create an empty store. A `sample_cap` of zero is treated as one.
    #[must_use]
    pub fn new(sample_cap: usize) -> Self {
        Self {
            entries: HashMap::new(),
            sample_cap: sample_cap.max(1),
        }
    }

    #[must_use]
    pub const fn sample_cap(&self) -> usize {
        self.sample_cap
    }

    /// Merge or insert `change`, keeping `queue` in step.
    pub fn add<D>(
        &mut self,
        change: Change,
        queue: &mut PresentationQueue,
        decoder: &D,
    ) -> MergeOutcome
    where
        D: ProfileDecoder + ?Sized,
    {
        let cap = self.sample_cap;
        let (key, tracked) = match self.entries.entry(ChangeKey::of(&change)) {
            Entry::Vacant(slot) => {
                let tracked = seed(change, cap, decoder);
                queue.enqueue(slot.key().clone(), &tracked.change);
                tracing::debug!(key = %slot.key(), "tracking new change");
                slot.insert(tracked);
                return MergeOutcome::Inserted;
            }
            Entry::Occupied(slot) => (slot.key().clone(), slot.into_mut()),
        };

        let Tracked { change: existing, overflow } = tracked;
        let time_advanced = match (&mut *existing, change) {
            (Change::NewSupporters(stored), Change::NewSupporters(incoming)) => {
                for contributor in incoming.supporters {
                    absorb(
                        &mut stored.supporters,
                        &mut stored.additional_count,
                        overflow,
                        contributor,
                        cap,
                        decoder,
                    );
                }
                advance(&mut stored.time, incoming.time)
            }
            (Change::NewFunders(stored), Change::NewFunders(incoming)) => {
                for contributor in incoming.funders {
                    absorb(
                        &mut stored.funders,
                        &mut stored.additional_count,
                        overflow,
                        contributor,
                        cap,
                        decoder,
                    );
                }
                advance(&mut stored.time, incoming.time)
            }
            (_, incoming) => {
                tracing::trace!(%key, kind = incoming.type_tag(), "ignoring repeat change");
                return MergeOutcome::Ignored;
            }
        };

        if time_advanced {
            if queue.remove(|entry| entry.matches(existing)).is_none() {
                tracing::warn!(%key, "queue entry missing while repositioning change");
            }
            queue.enqueue(key.clone(), existing);
        }
        tracing::debug!(%key, time_advanced, "merged change");
        MergeOutcome::Merged { time_advanced }
    }

    #[must_use]
    pub fn get(&self, key: &ChangeKey) -> Option<&Change> {
        self.entries.get(key).map(|tracked| &tracked.change)
    }

    #[must_use]
    pub fn contains(&self, key: &ChangeKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every change along with its overflow bookkeeping.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn seed<D>(mut change: Change, cap: usize, decoder: &D) -> Tracked
where
    D: ProfileDecoder + ?Sized,
{
    let mut overflow = HashSet::new();
    match &mut change {
        Change::NewSupporters(data) => {
            reseed(
                &mut data.supporters,
                &mut data.additional_count,
                &mut overflow,
                cap,
                decoder,
            );
        }
        Change::NewFunders(data) => {
            reseed(
                &mut data.funders,
                &mut data.additional_count,
                &mut overflow,
                cap,
                decoder,
            );
        }
        _ => {}
    }
    Tracked { change, overflow }
}

fn reseed<D>(
    sample: &mut Vec<Contributor>,
    additional: &mut u32,
    overflow: &mut HashSet<String>,
    cap: usize,
    decoder: &D,
) where
    D: ProfileDecoder + ?Sized,
{
    if *additional != 0 {
        tracing::debug!(additional = *additional, "ignoring upstream additional count");
        *additional = 0;
    }
    for contributor in std::mem::take(sample) {
        absorb(sample, additional, overflow, contributor, cap, decoder);
    }
}

fn absorb<D>(
    sample: &mut Vec<Contributor>,
    additional: &mut u32,
    overflow: &mut HashSet<String>,
    mut contributor: Contributor,
    cap: usize,
    decoder: &D,
) where
    D: ProfileDecoder + ?Sized,
{
    if sample.iter().any(|c| c.id == contributor.id) {
        return;
    }
    if sample.len() < cap {
        contributor.name = Some(resolve_name(decoder, &contributor));
        sample.push(contributor);
    } else if overflow.insert(contributor.id) {
        *additional = additional.saturating_add(1);
    }
}

const fn advance(stored: &mut i64, incoming: i64) -> bool {
    if incoming > *stored {
        *stored = incoming;
        true
    } else {
        false
    }
}
