//! Revisions and the timestamps used to order them.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Git's `%ci` layout, e.g. `2013-01-29 16:06:52 -0800`.
const GIT_COMMITTER_DATE: &str = "%Y-%m-%d %H:%M:%S %z";

/// ISO 8601 with a compact offset, e.g. `2013-01-29T16:06:52-0800`.
const ISO_COMPACT_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A timestamp that none of the supported layouts could parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unparsable timestamp '{0}'")]
pub struct TimestampError(pub String);

/// Parse a commit timestamp, keeping its UTC offset.
///
/// Accepts RFC 3339 (Mercurial's `rfc3339date` filter), git's `%ci` layout and
/// ISO 8601 with a `+hhmm` offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, GIT_COMMITTER_DATE))
        .or_else(|_| DateTime::parse_from_str(raw, ISO_COMPACT_OFFSET))
        .map_err(|_| TimestampError(raw.to_string()))
}

/// A single commit or changeset of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    id: String,
    project: String,
    timestamp: DateTime<FixedOffset>,
}

impl Revision {
    pub fn new(
        id: impl Into<String>,
        project: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            project: project.into(),
            timestamp,
        }
    }

    /// The VCS identifier (commit hash or changeset node).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the project this revision belongs to.
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.id)
    }
}
