//! Cache domain - Prediction cache keys and store abstraction

mod entry;
mod key;
mod repository;

pub use entry::{CacheLookup, CachedPrediction};
pub use key::{
    canonical_float, canonical_json, hash_value, CacheKey, RequestHasher, CACHE_KEY_LEN,
    FLOAT_DECIMALS,
};
pub use repository::{CacheStore, CacheStoreExt};

#[cfg(test)]
pub use repository::mock::MockCacheStore;
