use super::types::{Error, Kind};

/// Boxed error returned by user-supplied callbacks and factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a registration-time misconfiguration.
pub fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Configuration).with(e.into())
}

/// Creates an `Error` for a name nothing knows how to configure.
pub fn unconfigured_client(client: &str) -> Error {
    Error::new(Kind::UnconfiguredClient).with_client(client)
}

/// Creates an `Error` for a handler missing from the registry while building `client`.
pub fn handler_not_found(handler: &str, client: &str) -> Error {
    Error::new(Kind::HandlerNotFound {
        handler: handler.to_owned(),
    })
    .with_client(client)
}

/// Creates an `Error` for a handler factory failure.
pub fn handler_factory<E: Into<BoxError>>(handler: &str, client: &str, e: E) -> Error {
    Error::new(Kind::HandlerFactory {
        handler: handler.to_owned(),
    })
    .with(e.into())
    .with_client(client)
}

/// Creates an `Error` for a failed configuration callback.
///
/// A callback that reports the name as unconfigured keeps that kind.
pub fn callback<E: Into<BoxError>>(client: &str, e: E) -> Error {
    match e.into().downcast::<Error>() {
        Ok(err) if err.is_unconfigured_client() => (*err).with_client(client),
        Ok(err) => Error::new(Kind::Callback).with(*err).with_client(client),
        Err(e) => Error::new(Kind::Callback).with(e).with_client(client),
    }
}

/// Creates an `Error` for credentials about to leave over an insecure scheme.
pub fn insecure_transmission(scheme: &str) -> Error {
    Error::new(Kind::InsecureTransmission {
        scheme: scheme.to_owned(),
    })
}

/// Creates an `Error` for a request that could not be prepared.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}

/// Creates an `Error` for a primary transport failure.
pub fn transport<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Transport).with(e.into())
}

/// Creates an `Error` for a request that exceeded the client timeout.
pub fn timeout(client: &str) -> Error {
    Error::new(Kind::Timeout).with_client(client)
}

/// Creates an `Error` for a response body over the buffer limit.
pub fn payload_too_large(limit: u64) -> Error {
    Error::new(Kind::PayloadTooLarge { limit })
}
