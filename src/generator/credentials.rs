//! API key lookup, injected into generators rather than read from a global.
//!
//! [`EnvApiKey`] reads its environment variable lazily, the first time a
//! request actually needs a key, and remembers the answer for the lifetime
//! of the provider. When the variable is absent it falls back to a key from
//! `pack.toml`.

use super::GeneratorError;
use crate::config::GeneratorConfig;
use std::sync::OnceLock;

/// Source of the API key for a generator.
pub trait ApiKeyProvider: Sync {
    fn api_key(&self) -> Result<String, GeneratorError>;
}

/// Key from an environment variable, with an optional configured fallback.
#[derive(Debug)]
pub struct EnvApiKey {
    var: String,
    fallback: Option<String>,
    resolved: OnceLock<Option<String>>,
}

impl EnvApiKey {
    pub fn new(var: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            var: var.into(),
            fallback,
            resolved: OnceLock::new(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.api_key_env.clone(), config.api_key.clone())
    }
}

impl ApiKeyProvider for EnvApiKey {
    fn api_key(&self) -> Result<String, GeneratorError> {
        self.resolved
            .get_or_init(|| {
                std::env::var(&self.var)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .or_else(|| self.fallback.clone())
            })
            .clone()
            .ok_or_else(|| {
                GeneratorError::MissingCredentials(format!(
                    "set {} or generator.api_key in pack.toml",
                    self.var
                ))
            })
    }
}

/// A fixed key, mainly for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticApiKey(pub String);

impl ApiKeyProvider for StaticApiKey {
    fn api_key(&self) -> Result<String, GeneratorError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET_VAR: &str = "MEME_PACK_TEST_DEFINITELY_UNSET_KEY";

    #[test]
    fn falls_back_to_configured_key() {
        let provider = EnvApiKey::new(UNSET_VAR, Some("from-config".into()));
        assert_eq!(provider.api_key().unwrap(), "from-config");
    }

    #[test]
    fn missing_everywhere_is_credentials_error() {
        let provider = EnvApiKey::new(UNSET_VAR, None);
        let err = provider.api_key().unwrap_err();
        assert!(matches!(err, GeneratorError::MissingCredentials(_)));
        assert!(err.to_string().contains(UNSET_VAR));
    }

    #[test]
    fn environment_wins_over_fallback() {
        // PATH is set in every test environment
        let provider = EnvApiKey::new("PATH", Some("from-config".into()));
        assert_eq!(provider.api_key().unwrap(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn resolution_is_cached() {
        let provider = EnvApiKey::new(UNSET_VAR, Some("first".into()));
        assert_eq!(provider.api_key().unwrap(), "first");
        assert!(provider.resolved.get().is_some());
        assert_eq!(provider.api_key().unwrap(), "first");
    }

    #[test]
    fn from_config_uses_configured_names() {
        let config = GeneratorConfig {
            api_key_env: UNSET_VAR.into(),
            api_key: Some("k".into()),
            ..GeneratorConfig::default()
        };
        assert_eq!(EnvApiKey::from_config(&config).api_key().unwrap(), "k");
    }

    #[test]
    fn static_key_is_returned_verbatim() {
        assert_eq!(StaticApiKey("abc".into()).api_key().unwrap(), "abc");
    }
}
