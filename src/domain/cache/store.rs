//! Cache store contract shared by the in-process and networked backends

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// One cached response. Owned exclusively by the store; the dispatcher only
/// sees it through the get/set contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Serialized response body
    #[serde(with = "body_encoding")]
    pub body: Vec<u8>,
    /// Preserved end to end so non-JSON payloads (e.g. transcription text)
    /// come back with their original content type
    pub content_type: String,
    pub stored_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
            stored_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Stamps an expiry `ttl` from now; `None` means the entry never expires
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.expires_at = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .map(|d| Utc::now() + d)
        });
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Entry bodies are arbitrary bytes; base64 keeps them valid inside the
/// JSON representation the stores persist.
mod body_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// Key/value store with per-key expiry. Both backends implement this
/// identically; correctness of the relay never depends on the store being
/// available.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Looks up an entry. Expired entries behave as absent even if still
    /// physically present.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError>;

    /// Stores an entry, overwriting any existing value and resetting its
    /// expiry. Failures must not fail the enclosing request.
    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), DomainError>;

    /// Removes a single entry, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Removes every entry owned by this store
    async fn clear(&self) -> Result<(), DomainError>;

    /// Approximate number of live entries
    async fn len(&self) -> Result<usize, DomainError>;

    /// Releases background resources (e.g. the sweep task). Default no-op.
    async fn shutdown(&self) {}
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock store for dispatcher tests: records call counts and can be
    /// told to fail reads or writes.
    #[derive(Debug, Default)]
    pub struct MockCacheStore {
        entries: Mutex<HashMap<String, CacheEntry>>,
        get_calls: AtomicUsize,
        set_calls: AtomicUsize,
        fail_get: Mutex<Option<String>>,
        fail_set: Mutex<Option<String>>,
    }

    impl MockCacheStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry(self, key: &str, entry: CacheEntry) -> Self {
            self.entries.lock().unwrap().insert(key.to_string(), entry);
            self
        }

        pub fn failing_get(self, error: impl Into<String>) -> Self {
            *self.fail_get.lock().unwrap() = Some(error.into());
            self
        }

        pub fn failing_set(self, error: impl Into<String>) -> Self {
            *self.fail_set.lock().unwrap() = Some(error.into());
            self
        }

        pub fn get_calls(&self) -> usize {
            self.get_calls.load(Ordering::SeqCst)
        }

        pub fn set_calls(&self) -> usize {
            self.set_calls.load(Ordering::SeqCst)
        }

        pub fn entry(&self, key: &str) -> Option<CacheEntry> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl CacheStore for MockCacheStore {
        async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = self.fail_get.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }

            let entries = self.entries.lock().unwrap();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(Utc::now()) => Ok(Some(entry.clone())),
                _ => Ok(None),
            }
        }

        async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), DomainError> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = self.fail_set.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }

            self.entries.lock().unwrap().insert(key.to_string(), entry);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn len(&self) -> Result<usize, DomainError> {
            Ok(self.entries.lock().unwrap().len())
        }
    }
}
