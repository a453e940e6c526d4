//! Request handlers and the chain they compose into
//!
//! A handler sees each request on its way to the transport and decides
//! whether, and how often, to pass it on through [`Next`]. Handlers are
//! resolved by name from a [`HandlerRegistry`] when a client pipeline is
//! built.

pub mod chain;
pub mod func;
pub mod registry;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::message::{HttpRequest, HttpResponse};
use crate::transport::Transport;

pub use chain::HandlerChain;
pub use func::FnHandler;
pub use registry::{HandlerRegistration, HandlerRegistry};

/// An interceptor composed into a client's request pipeline.
pub trait Handler: Send + Sync {
    /// Handle `request`, usually by forwarding it with `next.run`.
    fn send<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, Result<HttpResponse>>;
}

/// The remainder of a chain after the current handler.
///
/// `Next` is `Copy`, so a handler may run the rest of the chain more than once.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    handlers: &'a [Arc<dyn Handler>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(handlers: &'a [Arc<dyn Handler>], transport: &'a dyn Transport) -> Self {
        Self {
            handlers,
            transport,
        }
    }

    /// Pass `request` to the next handler, or to the transport if none remain.
    pub fn run(self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse>> {
        match self.handlers.split_first() {
            Some((handler, rest)) => handler.send(request, Next::new(rest, self.transport)),
            None => self.transport.send(request),
        }
    }

    /// Handlers still ahead of the transport
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.handlers.len()
    }
}
