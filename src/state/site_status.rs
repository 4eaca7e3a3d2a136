/// Site status definitions for tracking indexing progress
///
/// A site record is created `Indexing` at the start of its pass and is
/// finalized to `Indexed` or `Failed`. A pass that is stopped midway keeps the
/// status of its last completed step.
use serde::Serialize;
use std::fmt;

/// Represents the indexing status of one site record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// Pass in progress (or stopped before finalization)
    Indexing,

    /// Crawl sequence exhausted without a fatal error
    Indexed,

    /// Crawl ended with a fatal error; `last_error` says why
    Failed,
}

impl SiteStatus {
    /// Returns true if no further updates are expected for this record
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::Failed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn all_statuses() -> [Self; 3] {
        [Self::Indexing, Self::Indexed, Self::Failed]
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
