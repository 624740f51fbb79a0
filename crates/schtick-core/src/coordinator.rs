use std::{fmt, sync::Arc};

use schtick_model::{KeySpace, LastRunRecord, Occurrence, lock_ttl_ms};
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument, warn};

use crate::{
    claim::ClaimPrimitive,
    store::{ClaimRequest, CoordinationStore, StoreError},
};

/// Result of a single claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This node now holds the occurrence and must run it.
    Claimed,
    /// Another node got there first. Expected, not an error.
    LostRace,
    /// The store could not be asked.
    StoreError(StoreError),
}

impl ClaimOutcome {
    #[inline]
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed)
    }
}

/// Turns an occurrence into a claim against the coordination store.
///
/// One coordinator per node; the host id it writes is fixed at construction.
/// Attempts are one-shot: nothing here retries.
pub struct LockCoordinator {
    store: Arc<dyn CoordinationStore>,
    primitive: Arc<dyn ClaimPrimitive>,
    keys: KeySpace,
    host_id: String,
}

impl fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("store", &self.store.name())
            .field("strategy", &self.primitive.strategy())
            .field("keys", &self.keys)
            .field("host_id", &self.host_id)
            .finish()
    }
}

impl LockCoordinator {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        primitive: Arc<dyn ClaimPrimitive>,
        keys: KeySpace,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            primitive,
            keys,
            host_id: host_id.into(),
        }
    }

    #[inline]
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    #[inline]
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    #[inline]
    pub fn primitive(&self) -> &Arc<dyn ClaimPrimitive> {
        &self.primitive
    }

    /// Build the request for `occurrence`, stamping `actual` as the claim time.
    pub fn claim_request(
        &self,
        occurrence: &Occurrence,
        window: Duration,
        actual: OffsetDateTime,
    ) -> Result<ClaimRequest, StoreError> {
        let last_run_value =
            LastRunRecord::new(occurrence.scheduled(), actual, self.host_id.as_str())
                .encode()
                .map_err(|e| StoreError::Encoding(e.to_string()))?;

        Ok(ClaimRequest {
            lock_key: self.keys.lock_key(occurrence),
            holder: self.host_id.clone(),
            ttl_ms: lock_ttl_ms(window),
            last_run_key: self.keys.last_run_key().to_string(),
            task: occurrence.task().to_string(),
            last_run_value,
        })
    }

    #[instrument(
        level = "debug",
        skip(self, occurrence, window),
        fields(task = %occurrence.task(), scheduled = %occurrence.scheduled_iso(), host = %self.host_id)
    )]
    pub async fn try_claim(&self, occurrence: &Occurrence, window: Duration) -> ClaimOutcome {
        let req = match self.claim_request(occurrence, window, OffsetDateTime::now_utc()) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "claim request rejected before reaching the store");
                return ClaimOutcome::StoreError(e);
            }
        };

        match self.primitive.claim(self.store.as_ref(), &req).await {
            Ok(true) => {
                debug!(key = %req.lock_key, ttl_ms = req.ttl_ms, "occurrence claimed");
                ClaimOutcome::Claimed
            }
            Ok(false) => {
                debug!(key = %req.lock_key, "occurrence already claimed elsewhere");
                ClaimOutcome::LostRace
            }
            Err(e) => {
                warn!(
                    key = %req.lock_key,
                    store = self.store.name(),
                    strategy = %self.primitive.strategy(),
                    error = %e,
                    "claim failed against coordination store"
                );
                ClaimOutcome::StoreError(e)
            }
        }
    }
}
