//! Engine configuration.

use lpscope_data::RetryPolicy;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Store call timeout in milliseconds.
pub const ENV_STORE_TIMEOUT_MS: &str = "LPSCOPE_STORE_TIMEOUT_MS";
/// Total attempts per store call.
pub const ENV_STORE_MAX_ATTEMPTS: &str = "LPSCOPE_STORE_MAX_ATTEMPTS";
/// Base retry backoff in milliseconds.
pub const ENV_STORE_BACKOFF_MS: &str = "LPSCOPE_STORE_BACKOFF_MS";
/// Rebuild passes before a raced rebuild gives up installing.
pub const ENV_CACHE_REBUILD_PASSES: &str = "LPSCOPE_CACHE_REBUILD_PASSES";

/// Configuration for the position cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How many times a rebuild is retried when an invalidation lands while
    /// it is fetching. The last pass's result is returned uncached.
    pub max_rebuild_passes: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_rebuild_passes: 3,
        }
    }
}

/// Configuration for the whole engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Timeout and retry policy for every store call.
    pub retry: RetryPolicy,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`; unset or unparsable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, ENV_STORE_TIMEOUT_MS) {
            config.retry.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, ENV_STORE_MAX_ATTEMPTS) {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_STORE_BACKOFF_MS) {
            config.retry.base_backoff = Duration::from_millis(ms);
        }
        if let Some(passes) = parse_var::<u32>(&lookup, ENV_CACHE_REBUILD_PASSES) {
            config.cache.max_rebuild_passes = passes.max(1);
        }

        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
