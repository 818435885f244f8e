//! Provider configuration entities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::request::Capability;
use crate::domain::DomainError;

/// Upstream provider families the relay can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "replicate")]
    Replicate,
    #[serde(rename = "cohere")]
    Cohere,
}

impl ProviderKind {
    /// Whether this provider family can serve the given capability
    pub fn supports(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            ProviderKind::OpenAi => true,
            ProviderKind::AzureOpenAi => {
                matches!(capability, ChatCompletion | Completion | Embeddings)
            }
            ProviderKind::Anthropic => matches!(capability, ChatCompletion | Completion),
            ProviderKind::Replicate => matches!(capability, ChatCompletion | ImageGeneration),
            ProviderKind::Cohere => {
                matches!(capability, ChatCompletion | Completion | Embeddings)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::AzureOpenAi => "azure_openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Replicate => "replicate",
            ProviderKind::Cohere => "cohere",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "azure_openai" | "azure" => Ok(ProviderKind::AzureOpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "replicate" => Ok(ProviderKind::Replicate),
            "cohere" => Ok(ProviderKind::Cohere),
            _ => Err(DomainError::configuration(format!(
                "Unknown provider kind: {}. Valid kinds: openai, azure_openai, anthropic, replicate, cohere",
                s
            ))),
        }
    }
}

/// One configured upstream provider. Immutable after load.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Unique name used to select this provider in requests
    pub name: String,
    pub kind: ProviderKind,
    /// API key or token presented to the upstream
    pub credential: String,
    /// Overrides the kind's default endpoint; required for AzureOpenAi
    pub base_url: Option<String>,
    /// Default Azure deployment when the request doesn't name one
    pub deployment_id: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            credential: credential.into(),
            base_url: None,
            deployment_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_deployment_id(mut self, deployment_id: impl Into<String>) -> Self {
        self.deployment_id = Some(deployment_id.into());
        self
    }

    /// Validates the entry at load time, before any request can reference it
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::configuration("Provider name cannot be empty"));
        }

        if self.credential.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Provider '{}' has an empty credential",
                self.name
            )));
        }

        if self.kind == ProviderKind::AzureOpenAi && self.base_url.is_none() {
            return Err(DomainError::configuration(format!(
                "Azure OpenAI provider '{}' requires a base_url (resource endpoint)",
                self.name
            )));
        }

        Ok(())
    }
}

// Manual Debug so credentials never end up in logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("credential", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("deployment_id", &self.deployment_id)
            .finish()
    }
}
