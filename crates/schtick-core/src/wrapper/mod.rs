//! Callback wrapper handed to the local scheduler.

mod callback;
pub use callback::{BoxFuture, Callback, CallbackError, CallbackResult, Predicate};

use std::sync::Arc;

use schtick_model::{ModelError, Occurrence, StoreErrorPolicy, Task};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{instrument, trace, warn};

use crate::{coordinator::ClaimOutcome, coordinator::LockCoordinator, store::StoreError};

/// Why a fire did not run the callback, other than losing the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The predicate returned `false`; the store was not touched.
    Declined,
    /// The store failed and the policy is [`StoreErrorPolicy::Swallow`].
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// This node claimed the occurrence and the callback completed.
    Ran,
    /// Another node claimed the occurrence.
    LostRace,
    Skipped(SkipReason),
}

impl FireOutcome {
    #[inline]
    pub fn ran(&self) -> bool {
        matches!(self, FireOutcome::Ran)
    }
}

#[derive(Debug, Error)]
pub enum FireError {
    #[error("claim failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Callback(#[from] CallbackError),
    #[error("invalid occurrence: {0}")]
    Occurrence(#[from] ModelError),
}

/// Shape a scheduler registers: called with the task and its scheduled time.
pub type WrappedFn =
    Arc<dyn Fn(Task, OffsetDateTime) -> BoxFuture<Result<FireOutcome, FireError>> + Send + Sync>;

/// A user callback gated by a claim in the coordination store.
///
/// Holds nothing while the callback runs: once claimed, ownership of the
/// occurrence lives in the store.
#[derive(Clone, Debug)]
pub struct Wrapped {
    coordinator: Arc<LockCoordinator>,
    callback: Callback,
    predicate: Option<Predicate>,
    on_store_error: StoreErrorPolicy,
}

impl Wrapped {
    pub(crate) fn new(
        coordinator: Arc<LockCoordinator>,
        callback: Callback,
        predicate: Option<Predicate>,
        on_store_error: StoreErrorPolicy,
    ) -> Self {
        Self {
            coordinator,
            callback,
            predicate,
            on_store_error,
        }
    }

    /// Only try to claim when `f` returns `true`.
    pub fn when<F>(mut self, f: F) -> Self
    where
        F: Fn(&Task, OffsetDateTime) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Predicate::new(f));
        self
    }

    #[inline]
    pub fn store_error_policy(&self) -> StoreErrorPolicy {
        self.on_store_error
    }

    /// Handle one fire of `task` scheduled at `scheduled`.
    #[instrument(
        level = "debug",
        skip(self, task, scheduled),
        fields(task = %task.name(), scheduled = %scheduled)
    )]
    pub async fn fire(
        &self,
        task: &Task,
        scheduled: OffsetDateTime,
    ) -> Result<FireOutcome, FireError> {
        if let Some(predicate) = &self.predicate
            && !predicate.allows(task, scheduled)
        {
            trace!("predicate declined occurrence");
            return Ok(FireOutcome::Skipped(SkipReason::Declined));
        }

        let occurrence = Occurrence::new(task.name(), scheduled)?;
        match self.coordinator.try_claim(&occurrence, task.window()).await {
            ClaimOutcome::Claimed => {
                self.callback.invoke(task, scheduled).await?;
                Ok(FireOutcome::Ran)
            }
            ClaimOutcome::LostRace => Ok(FireOutcome::LostRace),
            ClaimOutcome::StoreError(e) => match self.on_store_error {
                StoreErrorPolicy::Propagate => Err(FireError::Store(e)),
                StoreErrorPolicy::Swallow => {
                    warn!(error = %e, "skipping occurrence, coordination store unavailable");
                    Ok(FireOutcome::Skipped(SkipReason::StoreUnavailable))
                }
            },
        }
    }

    pub fn into_fn(self) -> WrappedFn {
        let this = Arc::new(self);
        Arc::new(
            move |task: Task,
                  scheduled: OffsetDateTime|
                  -> BoxFuture<Result<FireOutcome, FireError>> {
                let this = Arc::clone(&this);
                Box::pin(async move { this.fire(&task, scheduled).await })
            },
        )
    }
}
