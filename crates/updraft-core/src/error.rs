use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfigValue,
    MalformedChange,
    ProfileDecodeFailed,
    CursorReadFailed,
    CursorWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfigValue => "E1002",
            Self::MalformedChange => "E2001",
            Self::ProfileDecodeFailed => "E2002",
            Self::CursorReadFailed => "E3001",
            Self::CursorWriteFailed => "E3002",
            Self::LockContention => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfigValue => "Invalid config value",
            Self::MalformedChange => "Malformed change record",
            Self::ProfileDecodeFailed => "Profile blob could not be decoded",
            Self::CursorReadFailed => "Cursor read failed",
            Self::CursorWriteFailed => "Cursor write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .updraft/config.toml and retry."),
            Self::InvalidConfigValue => {
                Some("target_count and sample_cap must both be at least 1.")
            }
            Self::MalformedChange => {
                Some("Each input line must be one JSON change object with a `type` field.")
            }
            Self::ProfileDecodeFailed => None,
            Self::CursorReadFailed => {
                Some("Run `updraft reset` to discard the stored cursor and refetch.")
            }
            Self::CursorWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `updraft` process releases its lock.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
