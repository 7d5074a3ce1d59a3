//! Redis cache store implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

const BACKEND: &str = "redis";

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Entry lifetime; `None` stores without expiry
    pub time_to_live: Option<Duration>,
    /// Upper bound for a single command, including reconnects
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            time_to_live: None,
            operation_timeout: Duration::from_millis(250),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
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

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis-backed prediction cache shared by all replicas.
///
/// Every command is bounded by `operation_timeout` so a slow or unreachable
/// server surfaces as `StoreUnavailable` instead of stalling the request.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;

        let connection = tokio::time::timeout(
            config.operation_timeout.max(Duration::from_secs(1)),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| DomainError::store_unavailable(BACKEND, "Timed out connecting to Redis"))?
        .map_err(|e| {
            DomainError::store_unavailable(BACKEND, format!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn bounded<T, F>(&self, action: &str, future: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, future).await {
            Ok(result) => result.map_err(|e| {
                DomainError::store_unavailable(BACKEND, format!("Failed to {}: {}", action, e))
            }),
            Err(_) => Err(DomainError::store_unavailable(
                BACKEND,
                format!("Timed out after {:?} trying to {}", self.config.operation_timeout, action),
            )),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.bounded(
            &format!("get key '{}'", key),
            conn.get::<_, Option<String>>(&prefixed_key),
        )
        .await
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();
        let action = format!("set key '{}'", key);

        match self.config.time_to_live {
            Some(ttl) => {
                let ttl_secs = ttl.as_secs().max(1);
                self.bounded(&action, conn.set_ex::<_, _, ()>(&prefixed_key, value, ttl_secs))
                    .await
            }
            None => {
                self.bounded(&action, conn.set::<_, _, ()>(&prefixed_key, value))
                    .await
            }
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = self
            .bounded("ping", redis::cmd("PING").query_async(&mut conn))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CacheStoreExt, CachedPrediction};

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379")
            .with_key_prefix("trip-test")
            .with_time_to_live(Duration::from_secs(60))
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();
        let entry = CachedPrediction::new(11.0, "v1");

        cache.set("key1", &entry).await.unwrap();

        let result: Option<CachedPrediction> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some(entry));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping_and_overwrite() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache.ping().await.unwrap();
        cache.set("overwrite", &1.0_f64).await.unwrap();
        cache.set("overwrite", &2.0_f64).await.unwrap();

        let result: Option<f64> = cache.get("overwrite").await.unwrap();
        assert_eq!(result, Some(2.0));
    }

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let result = RedisCache::new(RedisCacheConfig::new("not-a-url")).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_config_builders() {
        let config = RedisCacheConfig::new("redis://localhost")
            .with_key_prefix("trips")
            .with_operation_timeout(Duration::from_millis(100));

        assert_eq!(config.key_prefix, Some("trips".to_string()));
        assert_eq!(config.operation_timeout, Duration::from_millis(100));
        assert!(config.time_to_live.is_none());
    }
}
