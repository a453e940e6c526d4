//! Client factory configuration

use std::time::Duration;

use super::validation::{ConfigDefaults, ConfigResult, ConfigValidator};

/// Settings for the client factory's pipeline cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// How long a built handler chain is reused before the next request rebuilds it
    pub handler_lifetime: Duration,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            handler_lifetime: ConfigDefaults::DEFAULT_HANDLER_LIFETIME,
        }
    }
}

impl FactoryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that rebuilds pipelines quickly, for tests and connection rotation
    #[must_use]
    pub fn short_lived() -> Self {
        Self {
            handler_lifetime: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_handler_lifetime(mut self, lifetime: Duration) -> Self {
        self.handler_lifetime = lifetime;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the handler lifetime is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(Some(self.handler_lifetime), "handler_lifetime")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::ConfigurationError;

    #[test]
    fn default_lifetime_is_two_minutes() {
        let config = FactoryConfig::default();
        assert_eq!(config.handler_lifetime, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_lifetime_is_invalid() {
        let config = FactoryConfig::new().with_handler_lifetime(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidTimeout(_))
        ));
    }
}
