use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tracing::trace;

use super::{ClaimRequest, CoordinationStore, StoreError, WriteOp};

/// Lock record as currently held by the store.
#[derive(Debug, Clone)]
pub struct LockEntry {
    pub holder: String,
    pub ttl_ms: u64,
    expires_at: Option<Instant>,
}

impl LockEntry {
    fn new(holder: String, ttl_ms: u64) -> Self {
        let expires_at = Instant::now().checked_add(Duration::from_millis(ttl_ms));
        Self {
            holder,
            ttl_ms,
            expires_at,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-process coordination store.
///
/// Every operation runs under one mutex, so both claim operations are atomic
/// for all clones of the same store. Clones share state, which lets several
/// in-process "nodes" contend exactly as they would on a real store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    calls: AtomicU64,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct State {
    locks: HashMap<String, LockEntry>,
    hashes: HashMap<String, HashMap<String, String>>,
}

impl State {
    /// Evict `key` if its TTL has passed; report whether a live lock remains.
    fn holds(&mut self, key: &str, now: Instant) -> bool {
        match self.locks.get(key) {
            Some(entry) if entry.is_live(now) => true,
            Some(_) => {
                self.locks.remove(key);
                false
            }
            None => false,
        }
    }

    /// Drop every lock whose TTL has passed. Each occurrence has its own key,
    /// so an expired lock is otherwise never looked up again.
    fn evict_expired(&mut self, now: Instant) {
        self.locks.retain(|_, entry| entry.is_live(now));
    }

    fn hset(&mut self, key: &str, field: &str, value: &str) {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::SetWithExpiry { key, value, ttl_ms } => {
                self.locks
                    .insert(key.clone(), LockEntry::new(value.clone(), *ttl_ms));
            }
            WriteOp::HashSet { key, field, value } => self.hset(key, field, value),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations issued through [`CoordinationStore`].
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Live lock record at `key`, if any.
    pub fn lock_entry(&self, key: &str) -> Option<LockEntry> {
        let mut state = self.state();
        if state.holds(key, Instant::now()) {
            state.locks.get(key).cloned()
        } else {
            None
        }
    }

    /// Number of lock records still stored, expired ones included.
    pub fn lock_count(&self) -> usize {
        self.state().locks.len()
    }

    /// Drop the lock at `key` as if its TTL had run out.
    pub fn expire(&self, key: &str) -> bool {
        self.state().locks.remove(key).is_some()
    }

    /// Write a raw hash field, bypassing the claim path.
    pub fn put_hash(&self, key: &str, field: &str, value: &str) {
        self.state().hset(key, field, value);
    }

    /// Raw hash field, without counting as a store call.
    pub fn peek_hash(&self, key: &str, field: &str) -> Option<String> {
        self.state()
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        let mut state = self.state();
        state.evict_expired(Instant::now());
        Ok(state)
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set_absent_and_record(&self, req: &ClaimRequest) -> Result<bool, StoreError> {
        let mut state = self.enter()?;
        if state.holds(&req.lock_key, Instant::now()) {
            trace!(key = %req.lock_key, "lock already held");
            return Ok(false);
        }
        state.locks.insert(
            req.lock_key.clone(),
            LockEntry::new(req.holder.clone(), req.ttl_ms),
        );
        state.hset(&req.last_run_key, &req.task, &req.last_run_value);
        Ok(true)
    }

    async fn commit_if_absent(
        &self,
        guard_key: &str,
        writes: &[WriteOp],
    ) -> Result<bool, StoreError> {
        let mut state = self.enter()?;
        if state.holds(guard_key, Instant::now()) {
            trace!(key = %guard_key, "transaction precondition failed");
            return Ok(false);
        }
        for op in writes {
            state.apply(op);
        }
        Ok(true)
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let state = self.enter()?;
        Ok(state.hashes.get(key).and_then(|h| h.get(field)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str, holder: &str) -> ClaimRequest {
        ClaimRequest {
            lock_key: key.to_string(),
            holder: holder.to_string(),
            ttl_ms: 60_000,
            last_run_key: "p_last".to_string(),
            task: "t".to_string(),
            last_run_value: format!("v-{holder}"),
        }
    }

    #[tokio::test]
    async fn set_absent_only_once() {
        let store = MemoryStore::new();
        assert!(store.set_absent_and_record(&request("k", "a")).await.unwrap());
        assert!(!store.set_absent_and_record(&request("k", "b")).await.unwrap());

        let entry = store.lock_entry("k").unwrap();
        assert_eq!(entry.holder, "a");
        assert_eq!(entry.ttl_ms, 60_000);
        assert_eq!(store.peek_hash("p_last", "t").as_deref(), Some("v-a"));
    }

    #[tokio::test]
    async fn losing_claim_has_no_side_effects() {
        let store = MemoryStore::new();
        store.set_absent_and_record(&request("k", "a")).await.unwrap();
        store.set_absent_and_record(&request("k", "b")).await.unwrap();
        assert_eq!(store.peek_hash("p_last", "t").as_deref(), Some("v-a"));
    }

    #[tokio::test]
    async fn commit_if_absent_applies_all_writes() {
        let store = MemoryStore::new();
        let writes = [
            WriteOp::SetWithExpiry {
                key: "k".into(),
                value: "a".into(),
                ttl_ms: 1_000,
            },
            WriteOp::HashSet {
                key: "h".into(),
                field: "f".into(),
                value: "v".into(),
            },
        ];
        assert!(store.commit_if_absent("k", &writes).await.unwrap());
        assert!(!store.commit_if_absent("k", &writes).await.unwrap());
        assert_eq!(store.lock_entry("k").unwrap().holder, "a");
        assert_eq!(store.hash_get("h", "f").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn expired_lock_can_be_reclaimed() {
        let store = MemoryStore::new();
        let mut req = request("k", "a");
        req.ttl_ms = 0;
        assert!(store.set_absent_and_record(&req).await.unwrap());
        assert!(store.lock_entry("k").is_none());
        assert!(store.set_absent_and_record(&request("k", "b")).await.unwrap());
    }

    #[tokio::test]
    async fn expire_drops_lock() {
        let store = MemoryStore::new();
        store.set_absent_and_record(&request("k", "a")).await.unwrap();
        assert!(store.expire("k"));
        assert!(store.set_absent_and_record(&request("k", "b")).await.unwrap());
        assert_eq!(store.lock_entry("k").unwrap().holder, "b");
    }

    #[tokio::test]
    async fn unavailable_store_fails_and_counts_calls() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = store.hash_get("h", "f").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.calls(), 1);

        store.set_unavailable(false);
        assert_eq!(store.hash_get("h", "f").await.unwrap(), None);
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set_absent_and_record(&request("k", "a")).await.unwrap();
        assert!(!b.set_absent_and_record(&request("k", "b")).await.unwrap());
        assert_eq!(b.calls(), 2);
    }

    #[tokio::test]
    async fn expired_locks_do_not_accumulate() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            let mut req = request(&format!("k-{i}"), "a");
            req.ttl_ms = 0;
            assert!(store.set_absent_and_record(&req).await.unwrap());
        }
        assert!(store.lock_count() <= 1);

        store.hash_get("p_last", "t").await.unwrap();
        assert_eq!(store.lock_count(), 0);
    }

    #[tokio::test]
    async fn live_locks_survive_eviction() {
        let store = MemoryStore::new();
        store.set_absent_and_record(&request("live", "a")).await.unwrap();
        let mut short = request("short", "a");
        short.ttl_ms = 0;
        store.set_absent_and_record(&short).await.unwrap();

        store.hash_get("p_last", "t").await.unwrap();
        assert_eq!(store.lock_count(), 1);
        assert_eq!(store.lock_entry("live").unwrap().holder, "a");
    }
}
