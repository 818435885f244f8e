//! Application state shared across handlers

use std::sync::Arc;

use crate::domain::cache::CacheStore;
use crate::domain::dispatch::Dispatcher;

#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Also held here so the admin and health endpoints can reach the store
    /// directly
    pub cache: Option<Arc<dyn CacheStore>>,
    /// Accepted API keys; empty means the relay is open
    pub api_keys: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            cache: None,
            api_keys: Arc::new(Vec::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_api_keys(mut self, api_keys: Vec<String>) -> Self {
        self.api_keys = Arc::new(api_keys);
        self
    }
}
