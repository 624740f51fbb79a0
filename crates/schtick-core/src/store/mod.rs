//! Boundary to the shared coordination store.
//!
//! The lock only needs three capabilities from the store. Each implementation
//! must make the two claim operations atomic with respect to every other
//! client of the same store.

mod memory;
pub use memory::{LockEntry, MemoryStore};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),
    #[error("coordination store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("coordination store protocol error: {0}")]
    Protocol(String),
    #[error("claim request could not be encoded: {0}")]
    Encoding(String),
}

/// Everything one claim writes, precomputed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    /// `{prefix};{task};{scheduled}`
    pub lock_key: String,
    /// Value stored at the lock key.
    pub holder: String,
    /// Lock lifetime in milliseconds.
    pub ttl_ms: u64,
    /// Hash holding last-run entries.
    pub last_run_key: String,
    /// Field in the last-run hash.
    pub task: String,
    /// Encoded [`schtick_model::LastRunRecord`].
    pub last_run_value: String,
}

/// A write queued inside a conditional transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    SetWithExpiry {
        key: String,
        value: String,
        ttl_ms: u64,
    },
    HashSet {
        key: String,
        field: String,
        value: String,
    },
}

#[async_trait]
pub trait CoordinationStore: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Server-side atomic claim.
    ///
    /// If `lock_key` is absent: set it to `holder` with `ttl_ms` expiry, set
    /// `last_run_key[task] = last_run_value`, return `true`. Otherwise change
    /// nothing and return `false`.
    async fn set_absent_and_record(&self, req: &ClaimRequest) -> Result<bool, StoreError>;

    /// Optimistic transaction.
    ///
    /// Applies `writes` as one unit iff `guard_key` is absent when the
    /// transaction commits. Returns `false` when the precondition failed.
    async fn commit_if_absent(&self, guard_key: &str, writes: &[WriteOp])
    -> Result<bool, StoreError>;

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;
}
