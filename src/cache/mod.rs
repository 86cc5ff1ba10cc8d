//! Key-value caches. `NullCache` stores nothing, `RedisCache` keeps strings
//! in redis and `TypedCache` adds json (de)serialization on top of a string cache.

use std::marker::PhantomData;
use std::time::Duration;

use failure::{Error as FailureError, Fail};
use r2d2::Pool;
use r2d2_redis::redis::Commands;
use r2d2_redis::RedisConnectionManager;
use serde::de::DeserializeOwned;
use serde::ser::Serialize;
use serde_json;

pub trait Cache<T> {
    fn get(&self, key: &str) -> Result<Option<T>, FailureError>;
    fn set(&self, key: &str, value: T) -> Result<(), FailureError>;
    /// Returns true when a value was removed
    fn remove(&self, key: &str) -> Result<bool, FailureError>;
}

/// Cache that never holds anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        NullCache
    }
}

impl<T> Cache<T> for NullCache {
    fn get(&self, _key: &str) -> Result<Option<T>, FailureError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: T) -> Result<(), FailureError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<bool, FailureError> {
        Ok(false)
    }
}

/// String cache in redis, keys are prefixed with the namespace
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
    namespace: String,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub fn new(pool: Pool<RedisConnectionManager>, namespace: String) -> Self {
        Self { pool, namespace, ttl: None }
    }

    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self { ttl: Some(ttl), ..self }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl Cache<String> for RedisCache {
    fn get(&self, key: &str) -> Result<Option<String>, FailureError> {
        let mut conn = self.pool.get().map_err(|e| e.context("Failed to get redis connection"))?;
        let value: Option<String> = conn.get(self.key(key)).map_err(|e| e.context(format!("Redis GET {} failed", key)))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: String) -> Result<(), FailureError> {
        let mut conn = self.pool.get().map_err(|e| e.context("Failed to get redis connection"))?;
        let result: Result<(), _> = match self.ttl {
            Some(ttl) => conn.set_ex(self.key(key), value, ttl.as_secs() as usize),
            None => conn.set(self.key(key), value),
        };
        result.map_err(|e| e.context(format!("Redis SET {} failed", key)).into())
    }

    fn remove(&self, key: &str) -> Result<bool, FailureError> {
        let mut conn = self.pool.get().map_err(|e| e.context("Failed to get redis connection"))?;
        let removed: i64 = conn.del(self.key(key)).map_err(|e| e.context(format!("Redis DEL {} failed", key)))?;
        Ok(removed > 0)
    }
}

/// Stores values of type `T` as json in a string cache
pub struct TypedCache<C, T> {
    backend: C,
    phantom: PhantomData<fn() -> T>,
}

impl<C, T> TypedCache<C, T>
where
    C: Cache<String>,
{
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            phantom: PhantomData,
        }
    }
}

impl<C, T> Cache<T> for TypedCache<C, T>
where
    C: Cache<String>,
    T: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Result<Option<T>, FailureError> {
        match self.backend.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| e.context(format!("Cached value for {} is corrupted", key)).into()),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: T) -> Result<(), FailureError> {
        let raw = serde_json::to_string(&value)?;
        self.backend.set(key, raw)
    }

    fn remove(&self, key: &str) -> Result<bool, FailureError> {
        self.backend.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use failure::err_msg;

    use super::*;

    #[derive(Default)]
    struct InMemoryCache<T> {
        values: Mutex<HashMap<String, T>>,
    }

    impl<T> InMemoryCache<T> {
        fn new() -> Self {
            Self {
                values: Mutex::new(HashMap::new()),
            }
        }
    }

    impl<T: Clone> Cache<T> for InMemoryCache<T> {
        fn get(&self, key: &str) -> Result<Option<T>, FailureError> {
            let values = self.values.lock().map_err(|_| err_msg("In-memory cache lock is poisoned"))?;
            Ok(values.get(key).cloned())
        }

        fn set(&self, key: &str, value: T) -> Result<(), FailureError> {
            let mut values = self.values.lock().map_err(|_| err_msg("In-memory cache lock is poisoned"))?;
            values.insert(key.to_string(), value);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<bool, FailureError> {
            let mut values = self.values.lock().map_err(|_| err_msg("In-memory cache lock is poisoned"))?;
            Ok(values.remove(key).is_some())
        }
    }

    #[test]
    fn null_cache_is_always_empty() {
        let cache = NullCache::new();
        <NullCache as Cache<String>>::set(&cache, "key", "value".to_string()).unwrap();
        assert_eq!(<NullCache as Cache<String>>::get(&cache, "key").unwrap(), None);
        assert!(!<NullCache as Cache<String>>::remove(&cache, "key").unwrap());
    }

    #[test]
    fn typed_cache_round_trips_through_strings() {
        let cache = TypedCache::<_, Vec<i32>>::new(InMemoryCache::<String>::new());
        assert_eq!(cache.get("roles").unwrap(), None);
        cache.set("roles", vec![1, 2]).unwrap();
        assert_eq!(cache.get("roles").unwrap(), Some(vec![1, 2]));
        assert!(cache.remove("roles").unwrap());
        assert_eq!(cache.get("roles").unwrap(), None);
    }

    #[test]
    fn typed_cache_reports_corrupted_values() {
        let backend = InMemoryCache::<String>::new();
        backend.set("key", "not json".to_string()).unwrap();
        let cache = TypedCache::<_, Vec<i32>>::new(backend);
        assert!(cache.get("key").is_err());
    }
}
