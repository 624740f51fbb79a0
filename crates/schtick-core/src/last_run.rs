use std::{fmt, sync::Arc};

use schtick_model::{KeySpace, LastRunRecord};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::store::{CoordinationStore, StoreError};

/// Read side of the shared last-run hash.
///
/// Writes only ever happen inside a claim; this type never writes.
#[derive(Clone)]
pub struct LastRunStore {
    store: Arc<dyn CoordinationStore>,
    keys: KeySpace,
}

impl fmt::Debug for LastRunStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LastRunStore")
            .field("store", &self.store.name())
            .field("key", &self.keys.last_run_key())
            .finish()
    }
}

impl LastRunStore {
    pub fn new(store: Arc<dyn CoordinationStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Last successful claim of `task`, by any node.
    ///
    /// A missing or malformed entry is `Ok(None)`. Only transport failures
    /// are errors.
    pub async fn get(&self, task: &str) -> Result<Option<LastRunRecord>, StoreError> {
        let raw = self.store.hash_get(self.keys.last_run_key(), task).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let record = LastRunRecord::parse(&raw);
        if record.is_none() {
            debug!(task, value = %raw, "ignoring malformed last-run entry");
        }
        Ok(record)
    }

    /// Scheduled time of the last successful claim of `task`.
    pub async fn last_run_time(&self, task: &str) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(self.get(task).await?.map(|r| r.scheduled))
    }

    /// Where a freshly started scheduler should resume catching up from.
    ///
    /// Tasks without a positive window never catch up, so the store is not
    /// consulted for them.
    pub async fn catch_up_start(
        &self,
        task: &str,
        window: Duration,
    ) -> Result<Option<OffsetDateTime>, StoreError> {
        if window <= Duration::ZERO {
            return Ok(None);
        }
        self.last_run_time(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use time::macros::datetime;

    fn last_runs(store: &MemoryStore) -> LastRunStore {
        LastRunStore::new(Arc::new(store.clone()), KeySpace::default())
    }

    #[tokio::test]
    async fn unknown_task_is_none() {
        let store = MemoryStore::new();
        assert_eq!(last_runs(&store).get("never-ran").await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_entry_is_none() {
        let store = MemoryStore::new();
        store.put_hash("schyntax_last", "t", "2024-03-01T00:00:00Z");
        assert_eq!(last_runs(&store).get("t").await.unwrap(), None);

        store.put_hash("schyntax_last", "t", "2024-03-01T00:00:00Z;broken;host");
        assert_eq!(last_runs(&store).get("t").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reads_stored_record() {
        let store = MemoryStore::new();
        store.put_hash(
            "schyntax_last",
            "t",
            "2024-03-01T10:00:00Z;2024-03-01T10:00:00.2Z;node-b",
        );

        let record = last_runs(&store).get("t").await.unwrap().unwrap();
        assert_eq!(record.scheduled, datetime!(2024-03-01 10:00:00 UTC));
        assert_eq!(record.actual, datetime!(2024-03-01 10:00:00.2 UTC));
        assert_eq!(record.host, "node-b");
        assert_eq!(
            last_runs(&store).last_run_time("t").await.unwrap(),
            Some(datetime!(2024-03-01 10:00:00 UTC))
        );
    }

    #[tokio::test]
    async fn catch_up_without_window_skips_store() {
        let store = MemoryStore::new();
        let runs = last_runs(&store);
        assert_eq!(runs.catch_up_start("t", Duration::ZERO).await.unwrap(), None);
        assert_eq!(runs.catch_up_start("t", Duration::minutes(-1)).await.unwrap(), None);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn catch_up_with_window_reads_last_run() {
        let store = MemoryStore::new();
        store.put_hash(
            "schyntax_last",
            "t",
            "2024-03-01T10:00:00Z;2024-03-01T10:00:01Z;node-b",
        );
        let start = last_runs(&store)
            .catch_up_start("t", Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(start, Some(datetime!(2024-03-01 10:00:00 UTC)));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(last_runs(&store).get("t").await.is_err());
    }

    #[tokio::test]
    async fn custom_prefix_reads_its_own_hash() {
        let store = MemoryStore::new();
        store.put_hash(
            "jobs_last",
            "t",
            "2024-03-01T10:00:00Z;2024-03-01T10:00:01Z;node-b",
        );
        let runs = LastRunStore::new(Arc::new(store.clone()), KeySpace::new("jobs"));
        assert!(runs.get("t").await.unwrap().is_some());
        assert!(last_runs(&store).get("t").await.unwrap().is_none());
    }
}
