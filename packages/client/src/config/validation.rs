//! Option validation shared by factory and client options

use std::time::Duration;

/// Validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Reasons a set of options is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid base address: {0}")]
    InvalidBaseAddress(String),

    #[error("Invalid buffer size: {0}")]
    InvalidBufferSize(String),

    #[error("Invalid handler name: {0}")]
    InvalidHandlerName(String),
}

/// Common validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an optional duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the duration is zero.
    pub fn validate_timeout(timeout: Option<Duration>, name: &str) -> ConfigResult<()> {
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot be zero"
            )));
        }

        Ok(())
    }

    /// Validate an optional buffer size
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidBufferSize` if the size is zero.
    pub fn validate_buffer_size(size: Option<u64>, name: &str) -> ConfigResult<()> {
        if size == Some(0) {
            return Err(ConfigurationError::InvalidBufferSize(format!(
                "{name} cannot be zero"
            )));
        }

        Ok(())
    }

    /// Parse a base address, treating blank as unset
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidBaseAddress` if the address does
    /// not parse as an absolute http(s) URL.
    pub fn parse_base_address(address: Option<&str>) -> ConfigResult<Option<url::Url>> {
        let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            return Ok(None);
        };

        let url = url::Url::parse(address)
            .map_err(|e| ConfigurationError::InvalidBaseAddress(format!("{address}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBaseAddress(format!(
                "{address}: scheme must be http or https"
            )));
        }

        Ok(Some(url))
    }

    /// Validate a declared handler name
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidHandlerName` for blank names.
    pub fn validate_handler_name(name: &str) -> ConfigResult<()> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::InvalidHandlerName(
                "handler names cannot be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Common configuration defaults
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const DEFAULT_HANDLER_LIFETIME: Duration = Duration::from_secs(120);
}
