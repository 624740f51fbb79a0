//! Domain types shared by the schtick crates.
//!
//! Everything here is pure data: how an occurrence of a task is identified,
//! how its lock key and lock lifetime are derived, and how the per-task
//! last-run record is encoded in the coordination store.

mod error;
pub use error::ModelError;

mod task;
pub use task::Task;

mod occurrence;
pub use occurrence::{DEFAULT_KEY_PREFIX, KeySpace, Occurrence, to_iso8601, to_utc_iso8601};

mod ttl;
pub use ttl::{LOCK_TTL_MARGIN, MAX_LOCK_TTL_MS, lock_ttl, lock_ttl_ms};

mod last_run;
pub use last_run::LastRunRecord;

mod strategy;
pub use strategy::{ClaimStrategy, StoreErrorPolicy};

mod tick;
pub use tick::next_whole_second;
