//! Closure-backed transport

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::{SupportsCertificateValidationOverride, SupportsCookiePolicy, Transport};
use crate::error::Result;
use crate::message::{HttpRequest, HttpResponse};

type SendFn = dyn Fn(HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync;

/// Transport that answers requests with a closure instead of a socket.
///
/// Records the cookie and certificate settings applied to it so they can
/// be inspected after a pipeline build. Clones share the closure but not
/// the recorded settings.
#[derive(Clone)]
pub struct FnTransport {
    send: Arc<SendFn>,
    use_cookies: bool,
    accept_invalid_certificates: bool,
}

impl FnTransport {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        Self {
            send: Arc::new(move |request| Box::pin(f(request))),
            use_cookies: false,
            accept_invalid_certificates: false,
        }
    }

    #[must_use]
    pub fn uses_cookies(&self) -> bool {
        self.use_cookies
    }

    #[must_use]
    pub fn accepts_invalid_certificates(&self) -> bool {
        self.accept_invalid_certificates
    }
}

impl fmt::Debug for FnTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport")
            .field("use_cookies", &self.use_cookies)
            .field("accept_invalid_certificates", &self.accept_invalid_certificates)
            .finish_non_exhaustive()
    }
}

impl Transport for FnTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
        (self.send)(request)
    }
}

impl SupportsCookiePolicy for FnTransport {
    fn set_use_cookies(&mut self, enabled: bool) {
        self.use_cookies = enabled;
    }
}

impl SupportsCertificateValidationOverride for FnTransport {
    fn accept_invalid_certificates(&mut self) {
        self.accept_invalid_certificates = true;
    }
}
