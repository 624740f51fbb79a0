use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use schtick_core::{CoordinationStore, FireOutcome, LockConfig, MemoryStore, ScheduleLock};
use schtick_model::{Task, next_whole_second};
use schtick_observe::{LoggerConfig, logger_init};
use schtick_redis::{ENV_REDIS_URL, RedisConfig, RedisStore};
use time::OffsetDateTime;

const ENV_NODES: &str = "SCHTICK_DEMO_NODES";
const ENV_SECONDS: &str = "SCHTICK_DEMO_SECONDS";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    logger_init(&LoggerConfig::from_env()?)?;
    info!("logger initialized");

    // 2) Store: redis when configured, otherwise in-process
    let store: Arc<dyn CoordinationStore> = if std::env::var(ENV_REDIS_URL).is_ok() {
        let cfg = RedisConfig::from_env()?;
        Arc::new(RedisStore::connect(&cfg).await.context("connecting to redis")?)
    } else {
        info!("{ENV_REDIS_URL} not set, nodes share an in-memory store");
        Arc::new(MemoryStore::new())
    };

    // 3) Nodes: same task, same schedule, one shared store
    let base = LockConfig::from_env()?;
    let nodes: usize = env_or(ENV_NODES, 3)?;
    let seconds: u64 = env_or(ENV_SECONDS, 5)?;
    let task = Task::named("heartbeat");

    let mut handles = Vec::with_capacity(nodes);
    for i in 0..nodes {
        let host = format!("{}-{i}", base.host_id);
        let lock = ScheduleLock::new(Arc::clone(&store), base.clone().with_host_id(host.clone()))?;
        let wrapped = lock.wrap_fn(move |task, at| {
            info!(task = task.name(), scheduled = %at, host = %host, "running");
            Ok(())
        });
        let task = task.clone();
        handles.push(tokio::spawn(async move {
            let mut ran = 0u64;
            for _ in 0..seconds {
                let at = next_tick().await;
                match wrapped.fire(&task, at).await {
                    Ok(FireOutcome::Ran) => ran += 1,
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "fire failed"),
                }
            }
            ran
        }));
    }
    info!(nodes, seconds, "cluster running, press Ctrl+C to stop early");

    // 4) Wait for the ticks or Ctrl+C
    let total = tokio::select! {
        res = collect(handles) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down...");
            return Ok(());
        }
    };
    info!(total, expected = seconds, "occurrences run across the cluster");

    let lock = ScheduleLock::new(store, base)?;
    if let Some(last) = lock.last_run(task.name()).await? {
        info!(scheduled = %last.scheduled, host = %last.host, "last run");
    }
    Ok(())
}

async fn collect(handles: Vec<tokio::task::JoinHandle<u64>>) -> anyhow::Result<u64> {
    let mut total = 0;
    for h in handles {
        total += h.await?;
    }
    Ok(total)
}

/// Sleep until the next whole second and return it.
async fn next_tick() -> OffsetDateTime {
    let at = next_whole_second(OffsetDateTime::now_utc());
    let wait = (at - OffsetDateTime::now_utc()).max(time::Duration::ZERO);
    tokio::time::sleep(wait.unsigned_abs()).await;
    at
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("parsing {key}")),
        Err(_) => Ok(default),
    }
}
