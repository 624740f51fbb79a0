use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{error::ModelError, occurrence::to_iso8601};

const FIELD_SEPARATOR: char = ';';

/// Most recent successfully claimed occurrence of a task.
///
/// Stored as `{scheduled};{actual};{host}` in the shared last-run hash, one
/// entry per task name, overwritten by every successful claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastRunRecord {
    /// Time the scheduler intended the occurrence to run.
    pub scheduled: OffsetDateTime,
    /// Wall-clock UTC time the claim was made.
    pub actual: OffsetDateTime,
    /// Identity of the node that won the claim.
    pub host: String,
}

impl LastRunRecord {
    pub fn new(scheduled: OffsetDateTime, actual: OffsetDateTime, host: impl Into<String>) -> Self {
        Self {
            scheduled,
            actual,
            host: host.into(),
        }
    }

    pub fn encode(&self) -> Result<String, ModelError> {
        Ok(format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            to_iso8601(self.scheduled)?,
            to_iso8601(self.actual)?,
            self.host
        ))
    }

    /// Parse a stored value.
    ///
    /// Returns `None` for anything that is not a full, well-formed record. The
    /// host is everything after the second separator.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, FIELD_SEPARATOR);
        let scheduled = OffsetDateTime::parse(parts.next()?, &Rfc3339).ok()?;
        let actual = OffsetDateTime::parse(parts.next()?, &Rfc3339).ok()?;
        let host = parts.next()?;

        Some(Self {
            scheduled,
            actual,
            host: host.to_string(),
        })
    }
}
