//! Request dispatch - cache-aware orchestration of one capability request

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::cache::{request_fingerprint, CacheEntry, CacheStore};
use crate::domain::provider::{ProviderConfig, ProviderRegistry};
use crate::domain::request::{CacheControl, CapabilityRequest};
use crate::domain::upstream::{ProviderAdapter, UpstreamCall};
use crate::domain::DomainError;

/// Terminal result of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub body: Vec<u8>,
    pub content_type: String,
    pub served_from_cache: bool,
}

/// Orchestrates one `CapabilityRequest` end to end: resolve provider,
/// consult the cache, call upstream on a miss, populate the cache after a
/// verified success.
///
/// At most one upstream call and one cache write happen per invocation.
/// Concurrent identical requests may each miss and go upstream; that
/// stampede is accepted rather than serialized.
#[derive(Debug)]
pub struct Dispatcher {
    providers: Arc<ProviderRegistry>,
    adapter: Arc<dyn ProviderAdapter>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl Dispatcher {
    pub fn new(providers: Arc<ProviderRegistry>, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            providers,
            adapter,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn dispatch(&self, mut request: CapabilityRequest) -> Result<Dispatched, DomainError> {
        // Shape errors surface before any cache or upstream I/O
        request.validate()?;

        let provider = self.providers.resolve(&request.provider_name)?;

        // The effective deployment (request or provider default) is settled
        // before fingerprinting so deployments never share a cache entry
        request.deployment_id = resolve_deployment(&provider, &request)?;

        let key = self
            .cache
            .as_ref()
            .map(|_| request_fingerprint(&request));

        if request.cache_control == CacheControl::NoCache {
            if self.cache.is_some() {
                metrics::counter!("relay_cache_bypass_total").increment(1);
            }
        } else if let (Some(cache), Some(key)) = (&self.cache, &key) {
            match cache.get(key).await {
                Ok(Some(entry)) => {
                    metrics::counter!("relay_cache_hits_total").increment(1);
                    debug!(key = %key, "Cache hit");

                    return Ok(Dispatched {
                        body: entry.body,
                        content_type: entry.content_type,
                        served_from_cache: true,
                    });
                }
                Ok(None) => {
                    metrics::counter!("relay_cache_misses_total").increment(1);
                }
                // A degraded cache is a miss, never a failed request
                Err(error) => {
                    metrics::counter!("relay_cache_errors_total").increment(1);
                    warn!(error = %error, "Cache read failed, treating as miss");
                }
            }
        }

        let call = UpstreamCall {
            capability: request.capability,
            provider: &provider,
            payload: &request.payload,
            attachment: request.attachment.as_ref(),
            deployment_id: request.deployment_id.as_deref(),
        };

        let response = self.adapter.invoke(call).await.inspect_err(|_| {
            metrics::counter!("relay_upstream_errors_total").increment(1);
        })?;

        // Populate only after a verified-successful upstream call, and
        // without making the caller wait for the write.
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            let entry = CacheEntry::new(response.body.clone(), response.content_type.clone());
            let cache = cache.clone();

            tokio::spawn(async move {
                if let Err(error) = cache.set(&key, entry).await {
                    warn!(error = %error, key = %key, "Cache write failed");
                }
            });
        }

        Ok(Dispatched {
            body: response.body,
            content_type: response.content_type,
            served_from_cache: false,
        })
    }
}

/// Azure deployments come from the request (header or payload field) or the
/// provider's configured default; everything else needs none.
fn resolve_deployment(
    provider: &ProviderConfig,
    request: &CapabilityRequest,
) -> Result<Option<String>, DomainError> {
    if !provider.kind.supports(request.capability) {
        return Err(DomainError::unsupported_capability(
            &provider.name,
            format!(
                "Provider kind '{}' does not support '{}'",
                provider.kind, request.capability
            ),
        ));
    }

    if provider.kind != crate::domain::provider::ProviderKind::AzureOpenAi {
        return Ok(None);
    }

    request
        .deployment_id
        .clone()
        .or_else(|| provider.deployment_id.clone())
        .map(Some)
        .ok_or_else(|| {
            DomainError::unsupported_capability(
                &provider.name,
                "Azure OpenAI requires a deployment id (x-deployment-id header, \
                 deployment_id field, or provider configuration)",
            )
        })
}
