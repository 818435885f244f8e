//! Cache backend selection at startup

use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::memory::{MemoryStore, MemoryStoreConfig};
use super::redis::{RedisStore, RedisStoreConfig};

/// Supported cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-process sharded map
    #[default]
    Memory,
    /// Redis
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in_memory" | "inmemory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: memory, redis",
                s
            ))),
        }
    }
}

/// Settings consumed by the factory
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    /// TTL for stored entries; `None` disables expiry
    pub ttl: Option<Duration>,
    /// Sweep cadence for the memory backend
    pub sweep_interval: Duration,
    /// Connection URL, required for the Redis backend
    pub redis_url: Option<String>,
    /// Key prefix for the Redis backend
    pub key_prefix: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl: Some(Duration::from_secs(3600)),
            sweep_interval: Duration::from_secs(10),
            redis_url: None,
            key_prefix: None,
        }
    }
}

impl CacheSettings {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Factory for creating cache store instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a store based on the settings. The memory store's sweeper is
    /// started here; callers only need `shutdown` on the way out.
    pub async fn create(&self, settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, DomainError> {
        match settings.backend {
            CacheBackend::Memory => {
                let config = MemoryStoreConfig::default()
                    .with_ttl(settings.ttl)
                    .with_sweep_interval(settings.sweep_interval);

                let store = MemoryStore::new(config);
                store.start();

                Ok(Arc::new(store))
            }
            CacheBackend::Redis => {
                let url = settings.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis cache backend")
                })?;

                let mut config = RedisStoreConfig::new(url).with_ttl(settings.ttl);

                if let Some(prefix) = &settings.key_prefix {
                    config = config.with_key_prefix(prefix.clone());
                }

                let store = RedisStore::new(config).await?;

                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheEntry;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("in_memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert_eq!("REDIS".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
    }

    #[test]
    fn test_backend_from_str_invalid() {
        assert!("invalid".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(CacheBackend::Memory.to_string(), "memory");
        assert_eq!(CacheBackend::Redis.to_string(), "redis");
    }

    #[tokio::test]
    async fn test_factory_create_memory() {
        let factory = CacheFactory::new();
        let store = factory.create(&CacheSettings::memory()).await.unwrap();

        store
            .set("k", CacheEntry::new(b"v".to_vec(), "application/json"))
            .await
            .unwrap();

        let found = store.get("k").await.unwrap().unwrap();
        assert_eq!(found.body, b"v".to_vec());

        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_factory_redis_requires_url() {
        let factory = CacheFactory::new();
        let settings = CacheSettings {
            backend: CacheBackend::Redis,
            redis_url: None,
            ..Default::default()
        };

        assert!(factory.create(&settings).await.is_err());
    }
}
