use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error was raised at registration time.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.inner.kind, Kind::Configuration)
    }

    /// Returns true if no configuration applied to the requested client name.
    #[must_use]
    pub fn is_unconfigured_client(&self) -> bool {
        matches!(self.inner.kind, Kind::UnconfiguredClient)
    }

    /// Returns true if a declared handler was missing from the registry.
    #[must_use]
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self.inner.kind, Kind::HandlerNotFound { .. })
    }

    /// Name of the missing handler, if this is a handler-not-found error.
    #[must_use]
    pub fn missing_handler(&self) -> Option<&str> {
        match &self.inner.kind {
            Kind::HandlerNotFound { handler } => Some(handler),
            _ => None,
        }
    }

    /// Returns true if a configuration callback failed.
    #[must_use]
    pub fn is_callback(&self) -> bool {
        matches!(self.inner.kind, Kind::Callback)
    }

    /// Returns true if credentials were refused over an insecure scheme.
    #[must_use]
    pub fn is_insecure_transmission(&self) -> bool {
        matches!(self.inner.kind, Kind::InsecureTransmission { .. })
    }

    /// Returns true if the error is related to preparing the request.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.inner.kind, Kind::Request)
    }

    /// Returns true if the primary transport failed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport)
    }

    /// Returns true if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    /// Returns true if the response exceeded the buffer limit.
    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self.inner.kind, Kind::PayloadTooLarge { .. })
    }
}
