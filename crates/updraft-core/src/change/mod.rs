//! Tracked change model.
//!
//! A [`Change`] is one thing that happened to an idea or a solution, as
//! delivered by the upstream event source. Every variant carries `time`,
//! a Unix timestamp in milliseconds used for feed ordering.
//!
//! Supporter and funder changes carry a bounded sample of
//! [`Contributor`]s plus an overflow count; the feed folds repeated
//! arrivals for the same idea or solution into one of these.

pub mod kind;
pub mod wire;

pub use kind::ChangeKind;
pub use wire::{ChangeParseError, parse_changes};

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Reference to an idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Reference to a solution, with an optional opaque upstream snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Solution fields as delivered upstream. Passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<serde_json::Value>,
}

impl SolutionRef {
    /// Display label: the name when known, otherwise the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

/// A supporter or funder identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Wallet address.
    pub id: String,
    /// Hex-encoded JSON profile blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Resolved display name, filled in when the contributor enters a sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Contributor {
    /// Contributor with only an address.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: None,
            name: None,
        }
    }

    /// Attach a raw profile blob.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Name to show: the resolved name, falling back to the address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Payload of `newSupporter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportersData {
    pub idea: IdeaRef,
    #[serde(default)]
    pub supporters: Vec<Contributor>,
    #[serde(default)]
    pub additional_count: u32,
    pub time: i64,
}

/// Payload of `newSolution`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSolutionData {
    pub idea: IdeaRef,
    pub solution: SolutionRef,
    pub time: i64,
}

/// Payload of `newFunder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundersData {
    pub solution: SolutionRef,
    #[serde(default)]
    pub funders: Vec<Contributor>,
    #[serde(default)]
    pub additional_count: u32,
    pub time: i64,
}

/// Payload of `goalReached`, `goalFailed` and `solutionUpdated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionData {
    pub solution: SolutionRef,
    pub time: i64,
}

/// A change whose `type` tag this build does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedData {
    /// The raw `type` tag.
    pub kind: String,
    /// The whole upstream object, re-emitted verbatim on serialization.
    pub payload: serde_json::Value,
    pub time: i64,
}

/// One tracked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    NewSupporters(SupportersData),
    NewSolution(NewSolutionData),
    NewFunders(FundersData),
    GoalReached(SolutionData),
    GoalFailed(SolutionData),
    SolutionUpdated(SolutionData),
    Unrecognized(UnrecognizedData),
}

impl Change {
    /// The change kind, or `None` for an unrecognized change.
    #[must_use]
    pub const fn kind(&self) -> Option<ChangeKind> {
        match self {
            Self::NewSupporters(_) => Some(ChangeKind::NewSupporters),
            Self::NewSolution(_) => Some(ChangeKind::NewSolution),
            Self::NewFunders(_) => Some(ChangeKind::NewFunders),
            Self::GoalReached(_) => Some(ChangeKind::GoalReached),
            Self::GoalFailed(_) => Some(ChangeKind::GoalFailed),
            Self::SolutionUpdated(_) => Some(ChangeKind::SolutionUpdated),
            Self::Unrecognized(_) => None,
        }
    }

    /// The wire `type` tag, including unrecognized ones.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Unrecognized(data) => &data.kind,
            other => other.kind().map_or("", ChangeKind::as_str),
        }
    }

    /// Event time in Unix milliseconds.
    #[must_use]
    pub const fn time(&self) -> i64 {
        match self {
            Self::NewSupporters(d) => d.time,
            Self::NewSolution(d) => d.time,
            Self::NewFunders(d) => d.time,
            Self::GoalReached(d) | Self::GoalFailed(d) | Self::SolutionUpdated(d) => d.time,
            Self::Unrecognized(d) => d.time,
        }
    }

    /// Id of the entity this change is about.
    ///
    /// Supporter changes are about their idea; every other known variant
    /// is about a solution. Unrecognized changes have no subject.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Self::NewSupporters(d) => Some(&d.idea.id),
            Self::NewSolution(d) => Some(&d.solution.id),
            Self::NewFunders(d) => Some(&d.solution.id),
            Self::GoalReached(d) | Self::GoalFailed(d) | Self::SolutionUpdated(d) => {
                Some(&d.solution.id)
            }
            Self::Unrecognized(_) => None,
        }
    }

    /// One-line human readable description.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::NewSupporters(d) => format!(
                "{} supported {}",
                sample_phrase(&d.supporters, d.additional_count),
                d.idea.name
            ),
            Self::NewSolution(d) => format!(
                "New solution {} for {}",
                d.solution.label(),
                d.idea.name
            ),
            Self::NewFunders(d) => format!(
                "{} funded {}",
                sample_phrase(&d.funders, d.additional_count),
                d.solution.label()
            ),
            Self::GoalReached(d) => format!("{} reached its funding goal", d.solution.label()),
            Self::GoalFailed(d) => {
                format!("{} did not reach its funding goal", d.solution.label())
            }
            Self::SolutionUpdated(d) => format!("{} was updated", d.solution.label()),
            Self::Unrecognized(d) => format!("Unrecognized change '{}'", d.kind),
        }
    }
}

fn sample_phrase(sample: &[Contributor], additional: u32) -> String {
    let mut phrase = sample
        .iter()
        .map(Contributor::display_name)
        .collect::<Vec<_>>()
        .join(", ");
    if phrase.is_empty() {
        phrase.push_str("Someone");
    }
    if additional > 0 {
        let noun = if additional == 1 { "other" } else { "others" };
        let _ = write!(phrase, " and {additional} {noun}");
    }
    phrase
}
