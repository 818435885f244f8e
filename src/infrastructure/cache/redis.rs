//! Redis-backed cache store
//!
//! Entries are stored as JSON with the TTL delegated to Redis via `SET EX`.
//! Read-side failures (backend down, corrupt payload) are logged and
//! reported as a miss so the relay keeps serving.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::warn;

use crate::domain::cache::{CacheEntry, CacheStore};
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// TTL applied via `EX`; `None` stores entries without expiry
    pub ttl: Option<Duration>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            ttl: Some(Duration::from_secs(3600)),
            key_prefix: None,
        }
    }
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Redis store using a shared `ConnectionManager` for reconnection
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisStoreConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let raw: Option<String> = match conn.get(&prefixed_key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Redis GET failed, treating as miss");
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.is_expired(chrono::Utc::now()) => Ok(None),
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // A corrupt entry is unreadable forever; drop it
                warn!(key = %key, error = %e, "Corrupt cache entry, discarding");
                let _: Result<i32, _> = conn.del(&prefixed_key).await;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let entry = entry.with_ttl(self.config.ttl);
        let raw = serde_json::to_string(&entry)
            .map_err(|e| DomainError::cache(format!("Failed to serialize entry: {}", e)))?;

        match self.config.ttl {
            Some(ttl) => {
                let ttl_secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(&prefixed_key, raw, ttl_secs).await.map_err(|e| {
                    DomainError::cache(format!("Failed to set key '{}': {}", key, e))
                })?;
            }
            None => {
                let _: () = conn.set(&prefixed_key, raw).await.map_err(|e| {
                    DomainError::cache(format!("Failed to set key '{}': {}", key, e))
                })?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn
            .del(&prefixed_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        match &self.config.key_prefix {
            Some(_) => {
                // SCAN instead of KEYS so a large keyspace does not block
                // the server
                let pattern = self.prefix_key("*");
                let mut cursor = 0u64;

                loop {
                    let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn)
                        .await
                        .map_err(|e| DomainError::cache(format!("Failed to scan keys: {}", e)))?;

                    if !keys.is_empty() {
                        let _: i32 = conn.del(&keys).await.map_err(|e| {
                            DomainError::cache(format!("Failed to delete keys: {}", e))
                        })?;
                    }

                    cursor = new_cursor;

                    if cursor == 0 {
                        break;
                    }
                }
            }
            None => {
                redis::cmd("FLUSHDB")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to flush database: {}", e)))?;
            }
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        match &self.config.key_prefix {
            Some(_) => {
                let pattern = self.prefix_key("*");
                let mut cursor = 0u64;
                let mut count = 0usize;

                loop {
                    let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(1000)
                        .query_async(&mut conn)
                        .await
                        .map_err(|e| DomainError::cache(format!("Failed to scan keys: {}", e)))?;

                    count += keys.len();
                    cursor = new_cursor;

                    if cursor == 0 {
                        break;
                    }
                }

                Ok(count)
            }
            None => {
                let size: usize = redis::cmd("DBSIZE")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to get database size: {}", e)))?;

                Ok(size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance:
    // cargo test -- --ignored

    fn test_config() -> RedisStoreConfig {
        RedisStoreConfig::new("redis://127.0.0.1:6379")
            .with_key_prefix("relay-test")
            .with_ttl(Some(Duration::from_secs(60)))
    }

    fn entry(body: &str) -> CacheEntry {
        CacheEntry::new(body.as_bytes().to_vec(), "application/json")
    }

    #[test]
    fn test_key_prefix() {
        let store_config = RedisStoreConfig::new("redis://localhost").with_key_prefix("relay");
        assert_eq!(store_config.key_prefix, Some("relay".to_string()));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let store = RedisStore::new(test_config()).await.unwrap();

        store.set("key1", entry("value1")).await.unwrap();

        let found = store.get("key1").await.unwrap().unwrap();
        assert_eq!(found.body, b"value1".to_vec());

        store.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete() {
        let store = RedisStore::new(test_config()).await.unwrap();

        store.set("key1", entry("value1")).await.unwrap();

        assert!(store.delete("key1").await.unwrap());
        assert!(store.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_clear_scoped_to_prefix() {
        let store = RedisStore::new(test_config()).await.unwrap();

        store.set("key1", entry("value1")).await.unwrap();
        store.set("key2", entry("value2")).await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.len().await.unwrap(), 0);
    }
}
