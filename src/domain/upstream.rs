//! Provider adapter contract
//!
//! The dispatcher depends only on this interface; how a provider's wire
//! format looks is the adapter's concern.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::provider::ProviderConfig;
use crate::domain::request::{Attachment, Capability};
use crate::domain::DomainError;

/// Everything an adapter needs to execute one upstream call
#[derive(Debug, Clone, Copy)]
pub struct UpstreamCall<'a> {
    pub capability: Capability,
    pub provider: &'a ProviderConfig,
    pub payload: &'a serde_json::Value,
    pub attachment: Option<&'a Attachment>,
    /// Resolved Azure deployment, when the provider kind needs one
    pub deployment_id: Option<&'a str>,
}

/// Opaque upstream result: body bytes plus the content type to preserve
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub body: Vec<u8>,
    pub content_type: String,
}

impl UpstreamResponse {
    pub fn new(body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

/// Executes upstream calls for configured providers
#[async_trait]
pub trait ProviderAdapter: Send + Sync + Debug {
    async fn invoke(&self, call: UpstreamCall<'_>) -> Result<UpstreamResponse, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock adapter with a canned response or error, counting invocations
    #[derive(Debug)]
    pub struct MockAdapter {
        response: Option<UpstreamResponse>,
        error: Option<DomainError>,
        calls: AtomicUsize,
    }

    impl MockAdapter {
        pub fn new() -> Self {
            Self {
                response: None,
                error: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_response(mut self, response: UpstreamResponse) -> Self {
            self.response = Some(response);
            self
        }

        pub fn with_json(self, body: serde_json::Value) -> Self {
            self.with_response(UpstreamResponse::new(
                body.to_string().into_bytes(),
                "application/json",
            ))
        }

        pub fn with_error(mut self, error: DomainError) -> Self {
            self.error = Some(error);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for MockAdapter {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        async fn invoke(&self, call: UpstreamCall<'_>) -> Result<UpstreamResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = &self.error {
                return Err(DomainError::upstream(
                    &call.provider.name,
                    match error {
                        DomainError::Upstream { status, .. } => *status,
                        _ => None,
                    },
                    error.to_string(),
                ));
            }

            self.response.clone().ok_or_else(|| {
                DomainError::upstream(&call.provider.name, None, "No mock response configured")
            })
        }
    }
}
