use std::{fmt, future::Future, time::Duration};

use async_trait::async_trait;
use redis::{Client, RedisError, Script, aio::ConnectionManager};
use schtick_core::store::{ClaimRequest, CoordinationStore, StoreError, WriteOp};
use tracing::{debug, info, trace};

use crate::{config::RedisConfig, script::claim_and_record};

/// Coordination store backed by a Redis server.
///
/// Plain commands and the claim script share one auto-reconnecting
/// connection. Transactions need `WATCH` state of their own, so each one
/// opens a dedicated connection that is dropped when it completes.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    conn: ConnectionManager,
    claim_script: Script,
    timeout: Duration,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisStore {
    pub async fn connect(cfg: &RedisConfig) -> Result<Self, StoreError> {
        cfg.validate()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let client = Client::open(cfg.url.as_str()).map_err(store_error)?;
        let timeout = cfg.timeout();
        let conn = bounded(timeout, ConnectionManager::new(client.clone())).await?;

        info!(addr = %client.get_connection_info().addr, "connected to redis");
        Ok(Self {
            client,
            conn,
            claim_script: claim_and_record(),
            timeout,
        })
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn transact(&self, guard_key: &str, writes: &[WriteOp]) -> Result<bool, RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = redis::cmd("WATCH")
            .arg(guard_key)
            .query_async(&mut conn)
            .await?;
        let exists: bool = redis::cmd("EXISTS")
            .arg(guard_key)
            .query_async(&mut conn)
            .await?;
        if exists {
            let _: () = redis::cmd("UNWATCH").query_async(&mut conn).await?;
            return Ok(false);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in writes {
            match op {
                WriteOp::SetWithExpiry { key, value, ttl_ms } => {
                    pipe.cmd("SET").arg(key).arg(value).arg("PX").arg(*ttl_ms).ignore();
                }
                WriteOp::HashSet { key, field, value } => {
                    pipe.cmd("HSET").arg(key).arg(field).arg(value).ignore();
                }
            }
        }

        // EXEC answers nil when a watched key changed after WATCH.
        let committed: Option<()> = pipe.query_async(&mut conn).await?;
        if committed.is_none() {
            trace!(key = %guard_key, "transaction aborted by concurrent write");
        }
        Ok(committed.is_some())
    }
}

#[async_trait]
impl CoordinationStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set_absent_and_record(&self, req: &ClaimRequest) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.claim_script.key(&req.lock_key);
        invocation
            .key(&req.last_run_key)
            .arg(&req.holder)
            .arg(req.ttl_ms)
            .arg(&req.task)
            .arg(&req.last_run_value);

        let claimed: i64 = bounded(self.timeout, invocation.invoke_async(&mut conn)).await?;
        debug!(key = %req.lock_key, claimed = claimed == 1, "claim script finished");
        Ok(claimed == 1)
    }

    async fn commit_if_absent(
        &self,
        guard_key: &str,
        writes: &[WriteOp],
    ) -> Result<bool, StoreError> {
        bounded(self.timeout, self.transact(guard_key, writes)).await
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("HGET");
        cmd.arg(key).arg(field);
        bounded(self.timeout, cmd.query_async(&mut conn)).await
    }
}

/// Run one store call under `limit`, folding both failure modes into [`StoreError`].
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(store_error),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_REDIS_URL;
    use redis::ErrorKind;

    #[test]
    fn io_failures_are_unavailable() {
        let io = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(store_error(io), StoreError::Unavailable(_)));
    }

    #[test]
    fn server_replies_are_protocol_errors() {
        let e = RedisError::from((ErrorKind::TypeError, "unexpected reply"));
        assert!(matches!(store_error(e), StoreError::Protocol(_)));
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let limit = Duration::from_millis(10);
        let res: Result<(), StoreError> = bounded(limit, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert_eq!(res, Err(StoreError::Timeout(limit)));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_connecting() {
        let err = RedisStore::connect(&RedisConfig::new("")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    /// Live round trip, only when a server is configured.
    #[tokio::test]
    async fn live_claims_against_server() {
        let Ok(url) = std::env::var(ENV_REDIS_URL) else {
            return;
        };
        let store = RedisStore::connect(&RedisConfig::new(url)).await.unwrap();
        let unique = format!(
            "schtick-test-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );

        let req = ClaimRequest {
            lock_key: format!("{unique};t;2024-03-01T12:00:00Z"),
            holder: "node-a".into(),
            ttl_ms: 60_000,
            last_run_key: format!("{unique}_last"),
            task: "t".into(),
            last_run_value: "2024-03-01T12:00:00Z;2024-03-01T12:00:00Z;node-a".into(),
        };
        assert!(store.set_absent_and_record(&req).await.unwrap());
        assert!(!store.set_absent_and_record(&req).await.unwrap());
        assert_eq!(
            store.hash_get(&req.last_run_key, "t").await.unwrap().as_deref(),
            Some(req.last_run_value.as_str())
        );

        let guard = format!("{unique};t;2024-03-01T12:00:01Z");
        let writes = [
            WriteOp::SetWithExpiry {
                key: guard.clone(),
                value: "node-b".into(),
                ttl_ms: 60_000,
            },
            WriteOp::HashSet {
                key: req.last_run_key.clone(),
                field: "t".into(),
                value: "second".into(),
            },
        ];
        assert!(store.commit_if_absent(&guard, &writes).await.unwrap());
        assert!(!store.commit_if_absent(&guard, &writes).await.unwrap());
        assert_eq!(
            store.hash_get(&req.last_run_key, "t").await.unwrap().as_deref(),
            Some("second")
        );
    }
}
