//! Primary transports and the capabilities options can be applied through
//!
//! The transport sits innermost in every pipeline. Cookie policy and
//! certificate validation are separate capability traits; the pipeline only
//! accepts transports that implement both, so a transport lacking either one
//! is rejected at compile time rather than skipped with a warning.

pub mod cookie;
pub mod func;
pub mod http1;
pub mod tls;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::message::{HttpRequest, HttpResponse};

pub use cookie::Jar;
pub use func::FnTransport;
pub use http1::HyperTransport;

/// Sends a request over the wire (or anything standing in for it).
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>>;

    /// Stop reading a response body once it grows past `limit` bytes.
    ///
    /// Transports that buffer nothing themselves may ignore this; the client
    /// still rejects oversized bodies after the fact.
    fn set_max_response_buffer_size(&mut self, _limit: Option<u64>) {}
}

/// Transports that can store and replay cookies.
pub trait SupportsCookiePolicy {
    fn set_use_cookies(&mut self, enabled: bool);
}

/// Transports whose server certificate validation can be replaced.
pub trait SupportsCertificateValidationOverride {
    /// Install a validator that accepts any server certificate.
    fn accept_invalid_certificates(&mut self);
}

/// A transport the pipeline can apply every client option to.
pub trait PrimaryTransport:
    Transport + SupportsCookiePolicy + SupportsCertificateValidationOverride + 'static
{
}

impl<T> PrimaryTransport for T where
    T: Transport + SupportsCookiePolicy + SupportsCertificateValidationOverride + 'static
{
}
