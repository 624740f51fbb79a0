use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How a claim is made atomic in the coordination store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimStrategy {
    /// One server-side script: set-if-absent with expiry plus the last-run write.
    #[default]
    AtomicScript,
    /// Optimistic transaction guarded by "lock key absent", checked at commit.
    Transactional,
}

impl ClaimStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStrategy::AtomicScript => "atomic-script",
            ClaimStrategy::Transactional => "transactional",
        }
    }
}

impl fmt::Display for ClaimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "atomic-script" | "atomic" | "script" => Ok(ClaimStrategy::AtomicScript),
            "transactional" | "transaction" | "tx" => Ok(ClaimStrategy::Transactional),
            _ => Err(ModelError::InvalidStrategy(s.to_string())),
        }
    }
}

/// What a wrapped callback does when the store cannot be reached during a claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreErrorPolicy {
    /// Return the store error to the scheduler as a failed fire.
    #[default]
    Propagate,
    /// Log it and report the occurrence as skipped.
    Swallow,
}

impl StoreErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorPolicy::Propagate => "propagate",
            StoreErrorPolicy::Swallow => "swallow",
        }
    }
}

impl fmt::Display for StoreErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreErrorPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "propagate" => Ok(StoreErrorPolicy::Propagate),
            "swallow" | "swallow-and-skip" | "skip" => Ok(StoreErrorPolicy::Swallow),
            _ => Err(ModelError::InvalidPolicy(s.to_string())),
        }
    }
}
