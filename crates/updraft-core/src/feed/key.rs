//! Identity keys for tracked changes.
//!
//! Two changes with the same key describe the same feed entry. Keys ignore
//! which supporter or funder arrived, so a burst of supporters for one idea
//! collapses into a single entry instead of flooding the feed.

use crate::change::Change;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static UNRECOGNIZED_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stable deduplication key of a [`Change`].
///
/// The `Display` form is the canonical string key, e.g.
/// `idea-i1-newSupporter` or `solution-s1-goalReached`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeKey {
    NewSupporters { idea: String },
    NewSolution { idea: String, solution: String },
    SolutionUpdated { solution: String },
    NewFunders { solution: String },
    GoalReached { solution: String },
    GoalFailed { solution: String },
    /// Never equal to any other key: `seq` is unique per process.
    Unrecognized { received_ms: i64, seq: u64 },
}

impl ChangeKey {
    /// Derive the key of a change.
    #[must_use]
    pub fn of(change: &Change) -> Self {
        match change {
            Change::NewSupporters(d) => Self::NewSupporters {
                idea: d.idea.id.clone(),
            },
            Change::NewSolution(d) => Self::NewSolution {
                idea: d.idea.id.clone(),
                solution: d.solution.id.clone(),
            },
            Change::SolutionUpdated(d) => Self::SolutionUpdated {
                solution: d.solution.id.clone(),
            },
            Change::NewFunders(d) => Self::NewFunders {
                solution: d.solution.id.clone(),
            },
            Change::GoalReached(d) => Self::GoalReached {
                solution: d.solution.id.clone(),
            },
            Change::GoalFailed(d) => Self::GoalFailed {
                solution: d.solution.id.clone(),
            },
            Change::Unrecognized(_) => Self::Unrecognized {
                received_ms: chrono::Utc::now().timestamp_millis(),
                seq: UNRECOGNIZED_SEQ.fetch_add(1, Ordering::Relaxed),
            },
        }
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewSupporters { idea } => write!(f, "idea-{idea}-newSupporter"),
            Self::NewSolution { idea, solution } => {
                write!(f, "idea-{idea}-solution-{solution}-newSolution")
            }
            Self::SolutionUpdated { solution } => write!(f, "solution-{solution}-solutionUpdated"),
            Self::NewFunders { solution } => write!(f, "solution-{solution}-newFunder"),
            Self::GoalReached { solution } => write!(f, "solution-{solution}-goalReached"),
            Self::GoalFailed { solution } => write!(f, "solution-{solution}-goalFailed"),
            Self::Unrecognized { received_ms, .. } => write!(f, "unknown-{received_ms}"),
        }
    }
}
