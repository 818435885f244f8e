//! The normalized unit of work flowing through the dispatcher

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Categories of AI operation exposed uniformly across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ChatCompletion,
    Completion,
    Embeddings,
    AudioTranscription,
    AudioTranslation,
    ImageGeneration,
    ImageEdit,
    ImageVariation,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ChatCompletion => "chat_completion",
            Capability::Completion => "completion",
            Capability::Embeddings => "embeddings",
            Capability::AudioTranscription => "audio_transcription",
            Capability::AudioTranslation => "audio_translation",
            Capability::ImageGeneration => "image_generation",
            Capability::ImageEdit => "image_edit",
            Capability::ImageVariation => "image_variation",
        }
    }

    /// Capabilities that carry a binary file alongside the JSON payload
    pub fn requires_attachment(&self) -> bool {
        matches!(
            self,
            Capability::AudioTranscription
                | Capability::AudioTranslation
                | Capability::ImageEdit
                | Capability::ImageVariation
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-requested cache behavior for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheControl {
    #[default]
    Default,
    /// Skip the cache lookup and always go upstream
    NoCache,
}

/// Raw binary sidecar of a request (audio file, image, ...)
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// One normalized inbound request. Created per call, never mutated.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub capability: Capability,
    pub provider_name: String,
    /// Capability-specific arguments, forwarded to the upstream verbatim
    pub payload: serde_json::Value,
    pub attachment: Option<Attachment>,
    pub cache_control: CacheControl,
    /// Azure deployment resolved from a header or payload field
    pub deployment_id: Option<String>,
}

impl CapabilityRequest {
    pub fn new(
        capability: Capability,
        provider_name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            capability,
            provider_name: provider_name.into(),
            payload,
            attachment: None,
            cache_control: CacheControl::Default,
            deployment_id: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_cache_control(mut self, cache_control: CacheControl) -> Self {
        self.cache_control = cache_control;
        self
    }

    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }

    /// Checks the request shape before any cache or upstream I/O
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.payload.is_object() {
            return Err(DomainError::validation("Payload must be a JSON object"));
        }

        if self.provider_name.trim().is_empty() {
            return Err(DomainError::validation("Provider name is required"));
        }

        if self.capability.requires_attachment() && self.attachment.is_none() {
            return Err(DomainError::validation(format!(
                "Capability '{}' requires a file attachment",
                self.capability
            )));
        }

        Ok(())
    }
}
