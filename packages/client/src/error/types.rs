use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A Result alias where the Err case is `httpreg_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while registering, resolving, building or dispatching named clients.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Arc<dyn StdError + Send + Sync>>,
    pub(crate) client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Registration-time misconfiguration
    Configuration,
    /// No explicit configuration, convention match or dynamic callback for the name
    UnconfiguredClient,
    /// A declared handler has no registry entry
    HandlerNotFound { handler: String },
    /// A handler factory failed to produce an instance
    HandlerFactory { handler: String },
    /// A configuration callback or fallback constructor failed
    Callback,
    /// Credentials would be sent over a non-https scheme
    InsecureTransmission { scheme: String },
    /// The request could not be prepared
    Request,
    /// The primary transport failed
    Transport,
    /// Request exceeded the client timeout
    Timeout,
    /// Response body exceeds the configured buffer limit
    PayloadTooLarge { limit: u64 },
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                client: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    /// Attach the name of the client whose resolution or dispatch failed.
    #[must_use]
    pub fn with_client(mut self, client: impl Into<String>) -> Error {
        self.inner.client = Some(client.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Name of the client this error concerns, if any
    #[must_use]
    pub fn client(&self) -> Option<&str> {
        self.inner.client.as_deref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("httpreg::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref client) = self.inner.client {
            f.field("client", client);
        }

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Configuration => f.write_str("configuration error")?,
            Kind::UnconfiguredClient => f.write_str("no configuration applies to client")?,
            Kind::HandlerNotFound { handler } => {
                write!(f, "handler named `{handler}` was not found")?;
            }
            Kind::HandlerFactory { handler } => {
                write!(f, "handler named `{handler}` could not be created")?;
            }
            Kind::Callback => f.write_str("configuration callback failed")?,
            Kind::InsecureTransmission { scheme } => {
                write!(f, "refusing to transmit credentials over insecure scheme `{scheme}`")?;
            }
            Kind::Request => f.write_str("error preparing request")?,
            Kind::Transport => f.write_str("error sending request")?,
            Kind::Timeout => f.write_str("request timeout")?,
            Kind::PayloadTooLarge { limit } => {
                write!(f, "response content exceeds buffer limit of {limit} bytes")?;
            }
        }

        if let Some(ref client) = self.inner.client {
            write!(f, " (client `{client}`)")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
