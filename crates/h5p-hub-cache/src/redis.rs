//! Redis cache client with JSON-serialized values.

use std::future::Future;
use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, instrument, warn};

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisCache {
    /// Connects to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or the server is unreachable.
    pub async fn new(redis_url: &str, default_ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, default_ttl })
    }

    /// Returns `None` on a miss, a Redis error, or an undecodable value.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                debug!(cache.key = %key, "Cache hit");
                match serde_json::from_str(&value) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                        None
                    }
                }
            }
            Ok(None) => {
                debug!(cache.key = %key, "Cache miss");
                None
            }
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET error");
                None
            }
        }
    }

    /// Stores a value with the default TTL.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;

        conn.set_ex::<_, _, ()>(key, json, self.default_ttl.as_secs())
            .await?;

        debug!(cache.key = %key, cache.ttl_secs = %self.default_ttl.as_secs(), "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(key).await?;

        debug!(cache.key = %key, "Cache invalidated");

        Ok(())
    }

    /// Deletes every key matching a glob pattern, walking the keyspace with SCAN.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = %deleted, "Pattern invalidation complete");

        Ok(deleted)
    }
}

/// Serves `key` from the cache when possible, otherwise runs `load` and caches its result.
///
/// Cache failures never fail the read; only `load` errors propagate.
pub async fn read_through<T, E, F, Fut>(
    cache: Option<&RedisCache>,
    key: &str,
    load: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(cache) = cache
        && let Some(hit) = cache.get::<T>(key).await
    {
        return Ok(hit);
    }

    let value = load().await?;

    if let Some(cache) = cache
        && let Err(e) = cache.set(key, &value).await
    {
        warn!(cache.key = %key, error = %e, "Failed to populate cache");
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_read_through_without_cache_calls_loader() {
        let result: Result<TestData, String> = read_through(None, "h5p-hub:test", || async {
            Ok(TestData {
                id: 1,
                name: "quiz".to_string(),
            })
        })
        .await;

        assert_eq!(result.unwrap().name, "quiz");
    }

    #[tokio::test]
    async fn test_read_through_propagates_loader_error() {
        let result: Result<TestData, String> =
            read_through(None, "h5p-hub:test", || async { Err("db down".to_string()) }).await;

        assert_eq!(result.unwrap_err(), "db down");
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_and_invalidate_pattern() {
        let cache = RedisCache::new("redis://localhost:6379", Duration::from_secs(60))
            .await
            .unwrap();

        let data = TestData {
            id: 1,
            name: "test".to_string(),
        };

        cache.set("h5p-hub:test:1", &data).await.unwrap();
        let retrieved: Option<TestData> = cache.get("h5p-hub:test:1").await;
        assert_eq!(retrieved, Some(data));

        let deleted = cache.invalidate_pattern("h5p-hub:test*").await.unwrap();
        assert!(deleted >= 1);
        assert!(cache.get::<TestData>("h5p-hub:test:1").await.is_none());
    }
}
