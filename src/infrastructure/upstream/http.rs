//! HTTP provider adapter
//!
//! Forwards the request body verbatim to the provider's wire endpoint and
//! returns the raw response bytes. No payload translation happens here;
//! callers speak each provider's native dialect.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use crate::domain::provider::{ProviderConfig, ProviderKind};
use crate::domain::request::{Attachment, Capability};
use crate::domain::upstream::{ProviderAdapter, UpstreamCall, UpstreamResponse};
use crate::domain::DomainError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const AZURE_API_VERSION: &str = "2024-02-01";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Generic adapter over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProviderAdapter {
    client: Client,
}

impl HttpProviderAdapter {
    pub fn new() -> Result<Self, DomainError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn authorize(&self, builder: RequestBuilder, provider: &ProviderConfig) -> RequestBuilder {
        match provider.kind {
            ProviderKind::OpenAi | ProviderKind::Replicate | ProviderKind::Cohere => {
                builder.bearer_auth(&provider.credential)
            }
            ProviderKind::AzureOpenAi => builder.header("api-key", &provider.credential),
            ProviderKind::Anthropic => builder
                .header("x-api-key", &provider.credential)
                .header("anthropic-version", ANTHROPIC_VERSION),
        }
    }
}

fn base_url(provider: &ProviderConfig) -> Result<&str, DomainError> {
    if let Some(base_url) = &provider.base_url {
        return Ok(base_url.trim_end_matches('/'));
    }

    match provider.kind {
        ProviderKind::OpenAi => Ok("https://api.openai.com"),
        ProviderKind::Anthropic => Ok("https://api.anthropic.com"),
        ProviderKind::Replicate => Ok("https://api.replicate.com"),
        ProviderKind::Cohere => Ok("https://api.cohere.com"),
        // Azure has no public default; `ProviderConfig::validate` enforces
        // base_url up front
        ProviderKind::AzureOpenAi => Err(DomainError::configuration(format!(
            "Provider '{}' has no base URL configured",
            provider.name
        ))),
    }
}

fn capability_path(kind: ProviderKind, capability: Capability) -> &'static str {
    use Capability::*;

    match kind {
        ProviderKind::Anthropic => match capability {
            ChatCompletion => "/v1/messages",
            _ => "/v1/complete",
        },
        ProviderKind::Cohere => match capability {
            ChatCompletion => "/v1/chat",
            Completion => "/v1/generate",
            _ => "/v1/embed",
        },
        ProviderKind::Replicate => "/v1/predictions",
        // OpenAI wire shape; Azure appends these after the deployment
        // segment
        ProviderKind::OpenAi | ProviderKind::AzureOpenAi => match capability {
            ChatCompletion => "/v1/chat/completions",
            Completion => "/v1/completions",
            Embeddings => "/v1/embeddings",
            AudioTranscription => "/v1/audio/transcriptions",
            AudioTranslation => "/v1/audio/translations",
            ImageGeneration => "/v1/images/generations",
            ImageEdit => "/v1/images/edits",
            ImageVariation => "/v1/images/variations",
        },
    }
}

fn endpoint(call: &UpstreamCall<'_>) -> Result<String, DomainError> {
    let base = base_url(call.provider)?;
    let path = capability_path(call.provider.kind, call.capability);

    if call.provider.kind == ProviderKind::AzureOpenAi {
        let deployment = call.deployment_id.ok_or_else(|| {
            DomainError::configuration(format!(
                "Provider '{}' requires a deployment id",
                call.provider.name
            ))
        })?;
        let path = path.trim_start_matches("/v1");

        return Ok(format!(
            "{}/openai/deployments/{}{}?api-version={}",
            base, deployment, path, AZURE_API_VERSION
        ));
    }

    Ok(format!("{}{}", base, path))
}

/// Expands an object payload into multipart text parts plus the file part.
/// Non-string scalars are serialized as JSON so booleans and numbers survive.
fn multipart_form(
    payload: &serde_json::Value,
    attachment: &Attachment,
    capability: Capability,
) -> Form {
    let mut form = Form::new();

    if let Some(fields) = payload.as_object() {
        for (name, value) in fields {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(name.clone(), text);
        }
    }

    let field = match capability {
        Capability::ImageEdit | Capability::ImageVariation => "image",
        _ => "file",
    };

    let part = Part::bytes(attachment.data.to_vec())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.content_type)
        .unwrap_or_else(|_| {
            Part::bytes(attachment.data.to_vec()).file_name(attachment.file_name.clone())
        });

    form.part(field, part)
}

#[async_trait]
impl ProviderAdapter for HttpProviderAdapter {
    async fn invoke(&self, call: UpstreamCall<'_>) -> Result<UpstreamResponse, DomainError> {
        let url = endpoint(&call)?;
        debug!(provider = %call.provider.name, capability = %call.capability, url = %url, "Forwarding upstream");

        let builder = self.client.post(&url);
        let builder = self.authorize(builder, call.provider);

        let builder = match call.attachment {
            Some(attachment) => {
                builder.multipart(multipart_form(call.payload, attachment, call.capability))
            }
            None => builder.json(call.payload),
        };

        let response = builder.send().await.map_err(|e| {
            DomainError::upstream(&call.provider.name, None, format!("Request failed: {}", e))
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = response.bytes().await.map_err(|e| {
            DomainError::upstream(
                &call.provider.name,
                Some(status.as_u16()),
                format!("Failed to read response body: {}", e),
            )
        })?;

        if !status.is_success() {
            return Err(DomainError::upstream(
                &call.provider.name,
                Some(status.as_u16()),
                truncate_body(&body, status),
            ));
        }

        Ok(UpstreamResponse::new(body.to_vec(), content_type))
    }
}

fn truncate_body(body: &[u8], status: StatusCode) -> String {
    const MAX: usize = 2048;

    let text = String::from_utf8_lossy(body);
    let text = match text.char_indices().nth(MAX) {
        Some((idx, _)) => &text[..idx],
        None => &text,
    };

    format!("Upstream returned {}: {}", status, text)
}
