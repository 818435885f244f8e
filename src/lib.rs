//! LLM Relay
//!
//! A caching reverse proxy for generative AI providers:
//! - Uniform dispatch across chat, completion, embedding, audio, and image
//!   capabilities
//! - Deterministic request fingerprinting with attachment content hashing
//! - Pluggable cache backends (in-process or Redis)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::dispatch::Dispatcher;
use domain::provider::{ProviderConfig, ProviderRegistry};
use infrastructure::cache::{CacheBackend, CacheFactory, CacheSettings};
use infrastructure::upstream::HttpProviderAdapter;

/// Wires the registry, adapter, cache, and dispatcher from configuration.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let providers: Vec<ProviderConfig> = config
        .providers
        .iter()
        .map(|settings| {
            let mut provider =
                ProviderConfig::new(&settings.name, settings.kind, &settings.api_key);

            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url);
            }

            if let Some(deployment_id) = &settings.deployment_id {
                provider = provider.with_deployment_id(deployment_id);
            }

            provider
        })
        .collect();

    let registry = Arc::new(ProviderRegistry::from_configs(providers)?);
    let adapter = Arc::new(HttpProviderAdapter::new()?);

    let mut dispatcher = Dispatcher::new(registry, adapter);
    let mut cache = None;

    if config.cache.enabled {
        let backend: CacheBackend = config.cache.backend.parse()?;
        let ttl = match config.cache.ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut settings = CacheSettings {
            backend,
            ttl,
            sweep_interval: Duration::from_secs(config.cache.sweep_interval_seconds.max(1)),
            redis_url: config.cache.redis_url.clone(),
            key_prefix: config.cache.key_prefix.clone(),
        };

        if settings.key_prefix.is_none() && backend == CacheBackend::Redis {
            settings.key_prefix = Some("llm-relay".to_string());
        }

        let store = CacheFactory::new().create(&settings).await?;
        dispatcher = dispatcher.with_cache(store.clone());
        cache = Some(store);
    }

    let mut state = AppState::new(Arc::new(dispatcher))
        .with_api_keys(config.auth.api_keys.clone());

    if let Some(cache) = cache {
        state = state.with_cache(cache);
    }

    Ok(state)
}
