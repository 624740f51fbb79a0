use async_trait::async_trait;
use schtick_model::ClaimStrategy;

use super::ClaimPrimitive;
use crate::store::{ClaimRequest, CoordinationStore, StoreError};

/// Claim through the store's server-side set-if-absent-and-record evaluation.
///
/// Check, set and last-run write happen in one unit evaluated by the store,
/// in a single round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicScriptClaim;

#[async_trait]
impl ClaimPrimitive for AtomicScriptClaim {
    fn strategy(&self) -> ClaimStrategy {
        ClaimStrategy::AtomicScript
    }

    async fn claim(
        &self,
        store: &dyn CoordinationStore,
        req: &ClaimRequest,
    ) -> Result<bool, StoreError> {
        store.set_absent_and_record(req).await
    }
}
