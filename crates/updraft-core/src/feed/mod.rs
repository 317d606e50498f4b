//! Change feed aggregation: identity keys, the merge store, the
//! presentation queue and the [`TrackedChanges`] façade tying them together.

pub mod key;
pub mod queue;
pub mod store;
pub mod tracked;

pub use key::ChangeKey;
pub use queue::{PresentationQueue, QueueEntry};
pub use store::{DEFAULT_SAMPLE_CAP, MergeOutcome, MergeStore};
pub use tracked::{DEFAULT_TARGET_COUNT, FeedOptions, TrackedChanges};
