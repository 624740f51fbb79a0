//! Redis backend for the schtick coordination store.

mod config;
pub use config::{DEFAULT_TIMEOUT_MS, ENV_REDIS_TIMEOUT_MS, ENV_REDIS_URL, RedisConfig, RedisConfigError};

mod script;

mod store;
pub use store::RedisStore;
