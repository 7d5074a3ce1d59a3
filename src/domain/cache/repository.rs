//! Cache store trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Key-value store holding computed predictions.
///
/// Values are JSON strings so the trait stays dyn-compatible; use
/// [`CacheStoreExt`] for typed access. Expiry is a property of the backend,
/// configured when it is built, not of individual writes.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Backend name used in logs and health checks
    fn backend(&self) -> &'static str;

    /// Gets a raw JSON value; `Ok(None)` is a miss
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any existing one
    async fn set_raw(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Verifies the store is reachable
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheStoreExt: CacheStore {
    /// Gets a typed value from the store
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::store_unavailable(
                            self.backend(),
                            format!("Failed to deserialize cache value: {}", e),
                        )
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the store
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::internal(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data).await
        }
    }
}

// Blanket implementation for all types implementing CacheStore
impl<T: CacheStore + ?Sized> CacheStoreExt for T {}
