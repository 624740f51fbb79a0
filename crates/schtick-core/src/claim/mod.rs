//! Claim primitives: the indivisible "acquire lock + record last run" step.
//!
//! Two interchangeable strategies sit behind [`ClaimPrimitive`]; a deployment
//! picks one with [`primitive_for`] when the lock is built.

mod script;
pub use script::AtomicScriptClaim;

mod transaction;
pub use transaction::TransactionalClaim;

use std::sync::Arc;

use async_trait::async_trait;
use schtick_model::ClaimStrategy;

use crate::store::{ClaimRequest, CoordinationStore, StoreError};

#[async_trait]
pub trait ClaimPrimitive: Send + Sync {
    fn strategy(&self) -> ClaimStrategy;

    /// `Ok(true)` iff this call created the lock record (and wrote the
    /// last-run entry with it). `Ok(false)` means another holder is present.
    async fn claim(
        &self,
        store: &dyn CoordinationStore,
        req: &ClaimRequest,
    ) -> Result<bool, StoreError>;
}

pub fn primitive_for(strategy: ClaimStrategy) -> Arc<dyn ClaimPrimitive> {
    match strategy {
        ClaimStrategy::AtomicScript => Arc::new(AtomicScriptClaim),
        ClaimStrategy::Transactional => Arc::new(TransactionalClaim),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_matches_strategy() {
        for strategy in [ClaimStrategy::AtomicScript, ClaimStrategy::Transactional] {
            assert_eq!(primitive_for(strategy).strategy(), strategy);
        }
    }
}
