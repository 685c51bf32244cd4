use std::fmt;

/// Machine-readable error codes surfaced by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ItemNotFound,
    StorageFault,
    SchemaTooNew,
    ProfileFetchFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ConfigParseError,
        Self::ItemNotFound,
        Self::StorageFault,
        Self::SchemaTooNew,
        Self::ProfileFetchFailed,
        Self::InternalUnexpected,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::StorageFault => "E3001",
            Self::SchemaTooNew => "E3002",
            Self::ProfileFetchFailed => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Task not found",
            Self::StorageFault => "Task database failure",
            Self::SchemaTooNew => "Task database was written by a newer jot",
            Self::ProfileFetchFailed => "Profile could not be loaded",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the jot config.toml and retry."),
            Self::ItemNotFound => Some("Run `jot list` to see valid task ids."),
            Self::StorageFault => Some("Check disk space and write permissions for the database."),
            Self::SchemaTooNew => Some("Upgrade jot or point --db at a different database file."),
            Self::ProfileFetchFailed => Some("Check the network connection and the profile handle."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
