//! In-process cache backed by sharded hash maps
//!
//! Expired entries are dropped lazily on read and reclaimed by a periodic
//! sweep task so that unread keys cannot accumulate forever.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::cache::{CacheEntry, CacheStore};
use crate::domain::DomainError;

const SHARD_COUNT: usize = 16;

/// Configuration for the in-process store
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// TTL stamped onto stored entries; `None` means entries never expire
    pub ttl: Option<Duration>,
    /// How often the background sweep reclaims expired entries
    pub sweep_interval: Duration,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(3600)),
            sweep_interval: Duration::from_secs(10),
        }
    }
}

impl MemoryStoreConfig {
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

type Shard = RwLock<HashMap<String, CacheEntry>>;

/// Sharded in-process store. `new` does not start the sweeper; call
/// [`MemoryStore::start`] once the runtime is up and [`CacheStore::shutdown`]
/// (or drop) to stop it.
pub struct MemoryStore {
    shards: Arc<Vec<Shard>>,
    config: MemoryStoreConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("config", &self.config)
            .field("shards", &SHARD_COUNT)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}

impl MemoryStore {
    pub fn new(config: MemoryStoreConfig) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Self {
            shards: Arc::new(shards),
            config,
            sweeper: Mutex::new(None),
        }
    }

    /// Spawns the periodic sweep task. Calling it twice replaces the
    /// previous task.
    pub fn start(&self) {
        let shards = self.shards.clone();
        let interval = self.config.sweep_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick fires immediately; skip it
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let now = Utc::now();
                let mut reclaimed = 0usize;

                // One shard locked at a time so reads on other shards
                // proceed during the sweep
                for shard in shards.iter() {
                    if let Ok(mut map) = shard.write() {
                        let before = map.len();
                        map.retain(|_, entry| !entry.is_expired(now));
                        reclaimed += before - map.len();
                    }
                }

                if reclaimed > 0 {
                    debug!(reclaimed, "Swept expired cache entries");
                }
            }
        });

        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(previous) = sweeper.replace(handle) {
                previous.abort();
            }
        }
    }

    fn shard_for(&self, key: &str) -> &Shard {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % SHARD_COUNT]
    }

    fn lock_poisoned(key: &str) -> DomainError {
        DomainError::cache(format!("Shard lock poisoned for key '{}'", key))
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        let shard = self.shard_for(key);

        {
            let map = shard.read().map_err(|_| Self::lock_poisoned(key))?;

            match map.get(key) {
                Some(entry) if !entry.is_expired(Utc::now()) => {
                    return Ok(Some(entry.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry present but expired; reclaim it now rather than waiting
        // for the sweep
        let mut map = shard.write().map_err(|_| Self::lock_poisoned(key))?;

        if map.get(key).is_some_and(|e| e.is_expired(Utc::now())) {
            map.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), DomainError> {
        let entry = entry.with_ttl(self.config.ttl);
        let mut map = self
            .shard_for(key)
            .write()
            .map_err(|_| Self::lock_poisoned(key))?;

        map.insert(key.to_string(), entry);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut map = self
            .shard_for(key)
            .write()
            .map_err(|_| Self::lock_poisoned(key))?;

        Ok(map.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        for shard in self.shards.iter() {
            let mut map = shard
                .write()
                .map_err(|_| DomainError::cache("Shard lock poisoned"))?;
            map.clear();
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let now = Utc::now();
        let mut count = 0;

        for shard in self.shards.iter() {
            let map = shard
                .read()
                .map_err(|_| DomainError::cache("Shard lock poisoned"))?;
            count += map.values().filter(|e| !e.is_expired(now)).count();
        }

        Ok(count)
    }

    async fn shutdown(&self) {
        let handle = match self.sweeper.lock() {
            Ok(mut sweeper) => sweeper.take(),
            Err(_) => {
                warn!("Sweeper handle lock poisoned during shutdown");
                None
            }
        };

        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
