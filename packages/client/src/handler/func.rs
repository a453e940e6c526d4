//! Closure-backed terminal handler

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::message::{HttpRequest, HttpResponse};

use super::{Handler, Next};

type RespondFn = dyn Fn(HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync;

/// Handler that answers every request itself and never reaches the transport.
pub struct FnHandler {
    respond: Box<RespondFn>,
}

impl FnHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        Self {
            respond: Box::new(move |request| Box::pin(f(request))),
        }
    }
}

impl Handler for FnHandler {
    fn send<'a>(&'a self, request: HttpRequest, _next: Next<'a>) -> BoxFuture<'a, Result<HttpResponse>> {
        (self.respond)(request)
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
