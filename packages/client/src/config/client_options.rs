//! Per-name client options

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::validation::{ConfigResult, ConfigValidator};

/// Scalar transport settings plus the ordered handler names for one client.
///
/// Handlers run in declaration order on the way out: the first name is the
/// closest to the caller, the last sits directly in front of the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Base address relative request URIs are resolved against
    pub base_address: Option<String>,

    /// Whole-request timeout, in milliseconds when bound from configuration
    #[serde(
        rename = "timeout_ms",
        serialize_with = "millis::serialize",
        deserialize_with = "millis::deserialize"
    )]
    pub timeout: Option<Duration>,

    /// Largest response body the client buffers
    pub max_response_content_buffer_size: Option<u64>,

    pub use_cookies: bool,

    /// Accept any server certificate. Logged as a warning on every pipeline build.
    pub enable_bypass_invalid_certificate: bool,

    /// Handler names, outermost first
    pub handlers: Vec<String>,

    /// Overrides the factory's handler lifetime for this client
    #[serde(
        rename = "handler_lifetime_ms",
        serialize_with = "millis::serialize",
        deserialize_with = "millis::deserialize"
    )]
    pub handler_lifetime: Option<Duration>,
}

impl ClientOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_address(mut self, address: impl Into<String>) -> Self {
        self.base_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, name: impl Into<String>) -> Self {
        self.handlers.push(name.into());
        self
    }

    /// Append a handler name to the end of the pipeline.
    pub fn add_handler(&mut self, name: impl Into<String>) -> &mut Self {
        self.handlers.push(name.into());
        self
    }

    /// Check scalar settings before they are applied to a transport.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::parse_base_address(self.base_address.as_deref())?;
        ConfigValidator::validate_timeout(self.timeout, "timeout")?;
        ConfigValidator::validate_timeout(self.handler_lifetime, "handler_lifetime")?;
        ConfigValidator::validate_buffer_size(
            self.max_response_content_buffer_size,
            "max_response_content_buffer_size",
        )?;
        self.handlers
            .iter()
            .try_for_each(|name| ConfigValidator::validate_handler_name(name))
    }
}

mod millis {
    use super::{Deserialize, Deserializer, Duration, Serialize, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_from_snake_case_section() {
        let options: ClientOptions = serde_json::from_value(json!({
            "base_address": "http://foo.localhost/",
            "timeout_ms": 120_000,
            "handlers": ["BasicAuth", "status-handler"],
            "use_cookies": true
        }))
        .expect("section binds");

        assert_eq!(options.base_address.as_deref(), Some("http://foo.localhost/"));
        assert_eq!(options.timeout, Some(Duration::from_secs(120)));
        assert_eq!(options.handlers, vec!["BasicAuth", "status-handler"]);
        assert!(options.use_cookies);
        assert!(!options.enable_bypass_invalid_certificate);
        assert_eq!(options.handler_lifetime, None);
    }

    #[test]
    fn validate_rejects_bad_base_address() {
        let options = ClientOptions::new().with_base_address("not a url");
        assert!(options.validate().is_err());

        let options = ClientOptions::new()
            .with_base_address("http://foo.localhost")
            .with_handler("a");
        assert!(options.validate().is_ok());
    }
}
