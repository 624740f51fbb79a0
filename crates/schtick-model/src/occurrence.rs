use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::error::ModelError;

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "schyntax";

const KEY_SEPARATOR: char = ';';
const LAST_RUN_SUFFIX: &str = "_last";

/// Render a timestamp as ISO-8601 (RFC 3339 profile) keeping full sub-second precision.
pub fn to_iso8601(at: OffsetDateTime) -> Result<String, ModelError> {
    at.format(&Rfc3339)
        .map_err(|e| ModelError::InvalidTimestamp(e.to_string()))
}

/// Render the instant `at` in UTC, so equal instants render identically
/// whatever offset they carry.
pub fn to_utc_iso8601(at: OffsetDateTime) -> Result<String, ModelError> {
    let utc = at.checked_to_offset(UtcOffset::UTC).ok_or_else(|| {
        ModelError::InvalidTimestamp(format!("{at} has no UTC representation"))
    })?;
    to_iso8601(utc)
}

/// One firing instance of a task: `(task name, scheduled time)`.
///
/// The key rendering of the scheduled time is computed once, in UTC, so every
/// node that fires the same instant derives a byte-identical lock key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    task: String,
    scheduled: OffsetDateTime,
    iso: String,
}

impl Occurrence {
    pub fn new(task: impl Into<String>, scheduled: OffsetDateTime) -> Result<Self, ModelError> {
        let iso = to_utc_iso8601(scheduled)?;
        Ok(Self {
            task: task.into(),
            scheduled,
            iso,
        })
    }

    #[inline]
    pub fn task(&self) -> &str {
        &self.task
    }

    #[inline]
    pub fn scheduled(&self) -> OffsetDateTime {
        self.scheduled
    }

    /// Scheduled time as it appears in lock keys: UTC, full precision.
    #[inline]
    pub fn scheduled_iso(&self) -> &str {
        &self.iso
    }
}

/// Naming of every key this crate family writes to the coordination store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
    last_run_key: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let last_run_key = format!("{prefix}{LAST_RUN_SUFFIX}");
        Self {
            prefix,
            last_run_key,
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `{prefix};{task};{iso scheduled time}`
    pub fn lock_key(&self, occurrence: &Occurrence) -> String {
        let mut key = String::with_capacity(
            self.prefix.len() + occurrence.task.len() + occurrence.iso.len() + 2,
        );
        key.push_str(&self.prefix);
        key.push(KEY_SEPARATOR);
        key.push_str(&occurrence.task);
        key.push(KEY_SEPARATOR);
        key.push_str(&occurrence.iso);
        key
    }

    /// Hash holding one last-run entry per task name.
    #[inline]
    pub fn last_run_key(&self) -> &str {
        &self.last_run_key
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
