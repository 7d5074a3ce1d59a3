//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Type of cache to create
    pub cache_type: CacheType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing (Redis only)
    pub key_prefix: Option<String>,
    /// Entry lifetime; `None` means entries never expire
    pub time_to_live: Option<Duration>,
    /// Maximum capacity (for in-memory cache)
    pub max_capacity: u64,
    /// Per-command bound for Redis
    pub operation_timeout: Duration,
    /// Use an in-memory cache when Redis cannot be reached at startup
    pub fallback_to_memory: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            time_to_live: None,
            max_capacity: 100_000,
            operation_timeout: Duration::from_millis(250),
            fallback_to_memory: true,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for in-memory cache
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a new configuration for Redis cache
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            cache_type: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_fallback_to_memory(mut self, fallback: bool) -> Self {
        self.fallback_to_memory = fallback;
        self
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration.
    ///
    /// A Redis connection failure falls back to an in-memory cache when
    /// `fallback_to_memory` is set; an invalid URL is always an error.
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn CacheStore>, DomainError> {
        match config.cache_type {
            CacheType::InMemory => Ok(self.create_in_memory(config)),
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config =
                    RedisCacheConfig::new(url).with_operation_timeout(config.operation_timeout);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                if let Some(ttl) = config.time_to_live {
                    redis_config = redis_config.with_time_to_live(ttl);
                }

                match RedisCache::new(redis_config).await {
                    Ok(cache) => Ok(Arc::new(cache)),
                    Err(e @ DomainError::StoreUnavailable { .. }) if config.fallback_to_memory => {
                        warn!(error = %e, "Redis unreachable, using in-memory prediction cache");
                        Ok(self.create_in_memory(config))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn create_in_memory(&self, config: &CacheConfig) -> Arc<dyn CacheStore> {
        let mut in_memory_config =
            InMemoryCacheConfig::default().with_max_capacity(config.max_capacity);

        if let Some(ttl) = config.time_to_live {
            in_memory_config = in_memory_config.with_time_to_live(ttl);
        }

        Arc::new(InMemoryCache::with_config(in_memory_config))
    }
}
