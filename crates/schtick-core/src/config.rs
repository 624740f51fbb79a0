use schtick_model::{ClaimStrategy, DEFAULT_KEY_PREFIX, StoreErrorPolicy};

use crate::{error::CoreError, system::local_host_id};

pub const ENV_HOST_ID: &str = "SCHTICK_HOST_ID";
pub const ENV_KEY_PREFIX: &str = "SCHTICK_KEY_PREFIX";
pub const ENV_STRATEGY: &str = "SCHTICK_STRATEGY";
pub const ENV_ON_STORE_ERROR: &str = "SCHTICK_ON_STORE_ERROR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Written as lock holder and into last-run records.
    pub host_id: String,
    /// Prefix of every key in the coordination store.
    pub key_prefix: String,
    pub strategy: ClaimStrategy,
    pub on_store_error: StoreErrorPolicy,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self::new(local_host_id())
    }
}

impl LockConfig {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            strategy: ClaimStrategy::default(),
            on_store_error: StoreErrorPolicy::default(),
        }
    }

    pub fn with_host_id(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = host_id.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_strategy(mut self, strategy: ClaimStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_store_error_policy(mut self, policy: StoreErrorPolicy) -> Self {
        self.on_store_error = policy;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host_id.trim().is_empty() {
            return Err(CoreError::InvalidConfig("host id is empty".into()));
        }
        if self.key_prefix.is_empty() {
            return Err(CoreError::InvalidConfig("key prefix is empty".into()));
        }
        Ok(())
    }

    /// Defaults overlaid with `SCHTICK_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the `SCHTICK_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(ENV_HOST_ID) {
            Some(host) => Self::new(host),
            None => Self::default(),
        };
        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            cfg.key_prefix = prefix;
        }
        if let Some(strategy) = lookup(ENV_STRATEGY) {
            cfg.strategy = strategy.parse()?;
        }
        if let Some(policy) = lookup(ENV_ON_STORE_ERROR) {
            cfg.on_store_error = policy.parse()?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_uses_machine_identity() {
        let cfg = LockConfig::default();
        assert_eq!(cfg.host_id, local_host_id());
        assert_eq!(cfg.key_prefix, "schyntax");
        assert_eq!(cfg.strategy, ClaimStrategy::AtomicScript);
        assert_eq!(cfg.on_store_error, StoreErrorPolicy::Propagate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_values_are_rejected() {
        assert!(matches!(
            LockConfig::new("  ").validate(),
            Err(CoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            LockConfig::new("node").with_key_prefix("").validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let cfg = LockConfig::from_lookup(lookup(&[
            (ENV_HOST_ID, "node-7"),
            (ENV_KEY_PREFIX, "jobs"),
            (ENV_STRATEGY, "transactional"),
            (ENV_ON_STORE_ERROR, "swallow"),
        ]))
        .unwrap();

        assert_eq!(
            cfg,
            LockConfig::new("node-7")
                .with_key_prefix("jobs")
                .with_strategy(ClaimStrategy::Transactional)
                .with_store_error_policy(StoreErrorPolicy::Swallow)
        );
    }

    #[test]
    fn lookup_without_keys_is_default() {
        let cfg = LockConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, LockConfig::default());
    }

    #[test]
    fn bad_strategy_is_a_model_error() {
        let err = LockConfig::from_lookup(lookup(&[(ENV_STRATEGY, "quorum")])).unwrap_err();
        assert!(matches!(err, CoreError::Model(_)));
    }
}
