use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    #[error("Unsupported capability for provider '{provider}': {message}")]
    UnsupportedCapability { provider: String, message: String },

    #[error("Upstream error from '{provider}': {message}")]
    Upstream {
        provider: String,
        /// HTTP status returned by the provider, when one was received
        status: Option<u16>,
        message: String,
    },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    pub fn unsupported_capability(
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnsupportedCapability {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn upstream(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("payload must be a JSON object");
        assert_eq!(
            error.to_string(),
            "Validation error: payload must be a JSON object"
        );
    }

    #[test]
    fn test_unknown_provider_error() {
        let error = DomainError::unknown_provider("acme");
        assert_eq!(error.to_string(), "Unknown provider: acme");
    }

    #[test]
    fn test_upstream_error_keeps_status() {
        let error = DomainError::upstream("openai-main", Some(429), "rate limited");

        match error {
            DomainError::Upstream { status, .. } => assert_eq!(status, Some(429)),
            _ => panic!("expected upstream error"),
        }
    }
}
