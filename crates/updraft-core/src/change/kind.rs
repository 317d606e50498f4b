//! Change kind enum covering the six tracked change variants.
//!
//! The string representation is the camelCase `type` tag used on the wire
//! by the upstream event source (`newSupporter`, `goalReached`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six change kinds the feed knows how to key and merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// New supporters of an idea.
    NewSupporters,
    /// A solution was created for an idea.
    NewSolution,
    /// New funders of a solution.
    NewFunders,
    /// A solution reached its funding goal.
    GoalReached,
    /// A solution's deadline passed without reaching its goal.
    GoalFailed,
    /// A solution's metadata changed.
    SolutionUpdated,
}

/// Error returned when parsing an unknown change kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChangeKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown change type '{}': expected one of newSupporter, newSolution, \
             newFunder, goalReached, goalFailed, solutionUpdated",
            self.raw
        )
    }
}

impl std::error::Error for UnknownChangeKind {}

impl ChangeKind {
    /// All known change kinds.
    pub const ALL: [Self; 6] = [
        Self::NewSupporters,
        Self::NewSolution,
        Self::NewFunders,
        Self::GoalReached,
        Self::GoalFailed,
        Self::SolutionUpdated,
    ];

    /// Return the wire `type` tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewSupporters => "newSupporter",
            Self::NewSolution => "newSolution",
            Self::NewFunders => "newFunder",
            Self::GoalReached => "goalReached",
            Self::GoalFailed => "goalFailed",
            Self::SolutionUpdated => "solutionUpdated",
        }
    }

    /// Whether repeated changes of this kind fold into one feed entry.
    #[must_use]
    pub const fn is_mergeable(self) -> bool {
        matches!(self, Self::NewSupporters | Self::NewFunders)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = UnknownChangeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newSupporter" => Ok(Self::NewSupporters),
            "newSolution" => Ok(Self::NewSolution),
            "newFunder" => Ok(Self::NewFunders),
            "goalReached" => Ok(Self::GoalReached),
            "goalFailed" => Ok(Self::GoalFailed),
            "solutionUpdated" => Ok(Self::SolutionUpdated),
            _ => Err(UnknownChangeKind { raw: s.to_string() }),
        }
    }
}

// Serialized as the wire tag string.
impl Serialize for ChangeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_kinds() {
        let expected = [
            (ChangeKind::NewSupporters, "newSupporter"),
            (ChangeKind::NewSolution, "newSolution"),
            (ChangeKind::NewFunders, "newFunder"),
            (ChangeKind::GoalReached, "goalReached"),
            (ChangeKind::GoalFailed, "goalFailed"),
            (ChangeKind::SolutionUpdated, "solutionUpdated"),
        ];
        for (kind, s) in expected {
            assert_eq!(kind.to_string(), s);
            assert_eq!(kind.as_str(), s);
        }
    }

    #[test]
    fn from_str_roundtrips_every_kind() {
        for kind in ChangeKind::ALL {
            let parsed: ChangeKind = kind.as_str().parse().expect("known kind parses");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = "newBacker".parse::<ChangeKind>().expect_err("should fail");
        assert_eq!(err.raw, "newBacker");
        assert!(err.to_string().contains("newBacker"));
    }

    #[test]
    fn only_supporters_and_funders_merge() {
        let mergeable: Vec<_> = ChangeKind::ALL
            .into_iter()
            .filter(|k| k.is_mergeable())
            .collect();
        assert_eq!(
            mergeable,
            vec![ChangeKind::NewSupporters, ChangeKind::NewFunders]
        );
    }

    #[test]
    fn serde_uses_wire_tag() {
        let json = serde_json::to_string(&ChangeKind::GoalFailed).expect("serialize");
        assert_eq!(json, "\"goalFailed\"");
        let back: ChangeKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ChangeKind::GoalFailed);
    }
}
