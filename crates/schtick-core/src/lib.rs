//! Exactly-once execution of scheduled task occurrences across nodes.
//!
//! Every node runs the same local scheduler. When an occurrence fires, the
//! wrapped callback first claims `{prefix};{task};{scheduled}` in a shared
//! coordination store; only the node whose claim lands runs the callback.
//! The claim also records the task's last run in the same atomic unit.

pub mod claim;
pub mod store;

mod config;
pub use config::LockConfig;

mod coordinator;
pub use coordinator::{ClaimOutcome, LockCoordinator};

mod error;
pub use error::CoreError;

mod last_run;
pub use last_run::LastRunStore;

mod lock;
pub use lock::ScheduleLock;

mod system;
pub use system::{UNKNOWN_HOST, local_host_id, local_process_id};

pub mod wrapper;
pub use wrapper::{
    BoxFuture, Callback, CallbackError, CallbackResult, FireError, FireOutcome, Predicate,
    SkipReason, Wrapped, WrappedFn,
};

pub use store::{ClaimRequest, CoordinationStore, MemoryStore, StoreError, WriteOp};

pub mod prelude {
    pub use crate::{
        Callback, CallbackError, ClaimOutcome, CoordinationStore, FireError, FireOutcome,
        LockConfig, MemoryStore, ScheduleLock, StoreError,
    };
    pub use schtick_model::{ClaimStrategy, LastRunRecord, StoreErrorPolicy, Task};
}
