//! JSON wire format for [`Change`].
//!
//! Changes travel as JSON objects with an internal `type` tag and
//! camelCase fields:
//!
//! ```json
//! {"type":"newSupporter","idea":{"id":"i1","name":"Idea1"},
//!  "supporters":[{"id":"0xA"}],"time":1000}
//! ```
//!
//! A `type` this build does not know decodes to
//! [`Change::Unrecognized`] instead of failing, so the feed can still show
//! it. Streams are newline-delimited (one change per line).

use super::{
    Change, ChangeKind, FundersData, NewSolutionData, SolutionData, SupportersData,
    UnrecognizedData,
};
use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Serialize)]
#[serde(tag = "type")]
enum KnownRef<'a> {
    #[serde(rename = "newSupporter")]
    NewSupporters(&'a SupportersData),
    #[serde(rename = "newSolution")]
    NewSolution(&'a NewSolutionData),
    #[serde(rename = "newFunder")]
    NewFunders(&'a FundersData),
    #[serde(rename = "goalReached")]
    GoalReached(&'a SolutionData),
    #[serde(rename = "goalFailed")]
    GoalFailed(&'a SolutionData),
    #[serde(rename = "solutionUpdated")]
    SolutionUpdated(&'a SolutionData),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Known {
    #[serde(rename = "newSupporter")]
    NewSupporters(SupportersData),
    #[serde(rename = "newSolution")]
    NewSolution(NewSolutionData),
    #[serde(rename = "newFunder")]
    NewFunders(FundersData),
    #[serde(rename = "goalReached")]
    GoalReached(SolutionData),
    #[serde(rename = "goalFailed")]
    GoalFailed(SolutionData),
    #[serde(rename = "solutionUpdated")]
    SolutionUpdated(SolutionData),
}

impl From<Known> for Change {
    fn from(known: Known) -> Self {
        match known {
            Known::NewSupporters(d) => Self::NewSupporters(d),
            Known::NewSolution(d) => Self::NewSolution(d),
            Known::NewFunders(d) => Self::NewFunders(d),
            Known::GoalReached(d) => Self::GoalReached(d),
            Known::GoalFailed(d) => Self::GoalFailed(d),
            Known::SolutionUpdated(d) => Self::SolutionUpdated(d),
        }
    }
}

impl Serialize for Change {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let known = match self {
            Self::NewSupporters(d) => KnownRef::NewSupporters(d),
            Self::NewSolution(d) => KnownRef::NewSolution(d),
            Self::NewFunders(d) => KnownRef::NewFunders(d),
            Self::GoalReached(d) => KnownRef::GoalReached(d),
            Self::GoalFailed(d) => KnownRef::GoalFailed(d),
            Self::SolutionUpdated(d) => KnownRef::SolutionUpdated(d),
            Self::Unrecognized(d) => return d.payload.serialize(serializer),
        };
        known.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Change {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| serde::de::Error::missing_field("type"))?;

        if ChangeKind::from_str(tag).is_ok() {
            return serde_json::from_value::<Known>(value)
                .map(Self::from)
                .map_err(serde::de::Error::custom);
        }

        let kind = tag.to_string();
        let time = value
            .get("time")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or_default();
        Ok(Self::Unrecognized(UnrecognizedData {
            kind,
            payload: value,
            time,
        }))
    }
}

/// Error raised for a malformed line in a change stream.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ChangeParseError {
    /// 1-based line number.
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

impl ChangeParseError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedChange
    }
}

/// Parse a newline-delimited change stream. Blank lines are skipped.
///
/// # Errors
///
/// Returns a [`ChangeParseError`] for the first line that is not a valid
/// change object.
pub fn parse_changes(input: &str) -> Result<Vec<Change>, ChangeParseError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Change>(line).map_err(|source| ChangeParseError {
                line: idx + 1,
                source,
            })
        })
        .collect()
}
