//! Read-only provider lookup built once at startup

use std::collections::HashMap;
use std::sync::Arc;

use super::ProviderConfig;
use crate::domain::DomainError;

/// Name → provider map shared by all requests. Built from configuration
/// before the dispatcher exists and never mutated afterwards.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<ProviderConfig>>,
}

impl ProviderRegistry {
    /// Builds the registry, validating every entry. Duplicate names are a
    /// configuration error since requests address providers by name.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ProviderConfig>,
    ) -> Result<Self, DomainError> {
        let mut providers = HashMap::new();

        for config in configs {
            config.validate()?;

            if providers
                .insert(config.name.clone(), Arc::new(config))
                .is_some()
            {
                return Err(DomainError::configuration(
                    "Duplicate provider name in configuration",
                ));
            }
        }

        Ok(Self { providers })
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ProviderConfig>, DomainError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::unknown_provider(name))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::ProviderKind;

    fn sample_provider(name: &str) -> ProviderConfig {
        ProviderConfig::new(name, ProviderKind::OpenAi, "sk-test")
    }

    #[test]
    fn test_resolve_known_provider() {
        let registry = ProviderRegistry::from_configs(vec![sample_provider("p1")]).unwrap();

        let provider = registry.resolve("p1").unwrap();
        assert_eq!(provider.name, "p1");
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = ProviderRegistry::from_configs(vec![sample_provider("p1")]).unwrap();

        let result = registry.resolve("unknown");
        assert!(matches!(result, Err(DomainError::UnknownProvider { .. })));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result =
            ProviderRegistry::from_configs(vec![sample_provider("p1"), sample_provider("p1")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_entry_rejected() {
        let result = ProviderRegistry::from_configs(vec![ProviderConfig::new(
            "azure",
            ProviderKind::AzureOpenAi,
            "key",
        )]);
        assert!(result.is_err());
    }
}
