use async_trait::async_trait;
use schtick_model::ClaimStrategy;

use super::ClaimPrimitive;
use crate::store::{ClaimRequest, CoordinationStore, StoreError, WriteOp};

/// Claim through an optimistic transaction guarded by "lock key absent".
///
/// The guard is evaluated by the store at commit time; both writes land or
/// neither does.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionalClaim;

impl TransactionalClaim {
    fn writes(req: &ClaimRequest) -> [WriteOp; 2] {
        [
            WriteOp::SetWithExpiry {
                key: req.lock_key.clone(),
                value: req.holder.clone(),
                ttl_ms: req.ttl_ms,
            },
            WriteOp::HashSet {
                key: req.last_run_key.clone(),
                field: req.task.clone(),
                value: req.last_run_value.clone(),
            },
        ]
    }
}

#[async_trait]
impl ClaimPrimitive for TransactionalClaim {
    fn strategy(&self) -> ClaimStrategy {
        ClaimStrategy::Transactional
    }

    async fn claim(
        &self,
        store: &dyn CoordinationStore,
        req: &ClaimRequest,
    ) -> Result<bool, StoreError> {
        store.commit_if_absent(&req.lock_key, &Self::writes(req)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_lock_then_last_run() {
        let req = ClaimRequest {
            lock_key: "p;t;x".into(),
            holder: "node".into(),
            ttl_ms: 42,
            last_run_key: "p_last".into(),
            task: "t".into(),
            last_run_value: "x;y;node".into(),
        };
        let [lock, last] = TransactionalClaim::writes(&req);
        assert_eq!(
            lock,
            WriteOp::SetWithExpiry {
                key: "p;t;x".into(),
                value: "node".into(),
                ttl_ms: 42,
            }
        );
        assert_eq!(
            last,
            WriteOp::HashSet {
                key: "p_last".into(),
                field: "t".into(),
                value: "x;y;node".into(),
            }
        );
    }
}
