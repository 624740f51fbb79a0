use std::{future::Future, sync::Arc};

use schtick_model::{KeySpace, LastRunRecord, Task};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    claim::primitive_for,
    config::LockConfig,
    coordinator::LockCoordinator,
    error::CoreError,
    last_run::LastRunStore,
    store::{CoordinationStore, StoreError},
    wrapper::{Callback, CallbackResult, Predicate, Wrapped},
};

/// Entry point for one node: wraps scheduler callbacks and answers last-run
/// queries against the shared store.
#[derive(Clone, Debug)]
pub struct ScheduleLock {
    config: LockConfig,
    coordinator: Arc<LockCoordinator>,
    last_runs: LastRunStore,
}

impl ScheduleLock {
    pub fn new(store: Arc<dyn CoordinationStore>, config: LockConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let keys = KeySpace::new(config.key_prefix.as_str());
        let coordinator = Arc::new(LockCoordinator::new(
            Arc::clone(&store),
            primitive_for(config.strategy),
            keys.clone(),
            config.host_id.as_str(),
        ));
        let last_runs = LastRunStore::new(Arc::clone(&store), keys);

        info!(
            host = %config.host_id,
            prefix = %config.key_prefix,
            strategy = %config.strategy,
            on_store_error = %config.on_store_error,
            store = store.name(),
            "schedule lock ready"
        );
        Ok(Self {
            config,
            coordinator,
            last_runs,
        })
    }

    /// Gate `callback` behind a claim, optionally pre-filtered by `predicate`.
    pub fn wrap_with(&self, callback: Callback, predicate: Option<Predicate>) -> Wrapped {
        Wrapped::new(
            Arc::clone(&self.coordinator),
            callback,
            predicate,
            self.config.on_store_error,
        )
    }

    pub fn wrap(&self, callback: Callback) -> Wrapped {
        self.wrap_with(callback, None)
    }

    pub fn wrap_fn<F>(&self, f: F) -> Wrapped
    where
        F: Fn(&Task, OffsetDateTime) -> CallbackResult + Send + Sync + 'static,
    {
        self.wrap(Callback::immediate(f))
    }

    pub fn wrap_async<F, Fut>(&self, f: F) -> Wrapped
    where
        F: Fn(Task, OffsetDateTime) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.wrap(Callback::deferred(f))
    }

    pub async fn last_run(&self, task: &str) -> Result<Option<LastRunRecord>, StoreError> {
        self.last_runs.get(task).await
    }

    #[inline]
    pub fn last_runs(&self) -> &LastRunStore {
        &self.last_runs
    }

    #[inline]
    pub fn coordinator(&self) -> &Arc<LockCoordinator> {
        &self.coordinator
    }

    #[inline]
    pub fn config(&self) -> &LockConfig {
        &self.config
    }
}
