//! Ordered handler chain bound to a transport

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::message::{HttpRequest, HttpResponse};
use crate::transport::Transport;

use super::{Handler, Next};

/// Handlers in declaration order in front of one primary transport.
///
/// The first handler is closest to the caller. Requests pass through the
/// handlers in order before reaching the transport; responses come back in
/// reverse order. A chain is immutable and safe to share across concurrent
/// requests.
pub struct HandlerChain {
    names: Vec<String>,
    handlers: Vec<Arc<dyn Handler>>,
    transport: Arc<dyn Transport>,
}

impl HandlerChain {
    pub(crate) fn new(
        names: Vec<String>,
        handlers: Vec<Arc<dyn Handler>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        debug_assert_eq!(names.len(), handlers.len());
        Self {
            names,
            handlers,
            transport,
        }
    }

    /// Send `request` through every handler and then the transport.
    ///
    /// # Errors
    ///
    /// Returns whatever error a handler or the transport produces.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        Next::new(&self.handlers, self.transport.as_ref())
            .run(request)
            .await
    }

    /// Handler names in execution order
    #[must_use]
    pub fn handler_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use futures::future::BoxFuture;
    use http::{HeaderValue, Request, StatusCode};

    use super::*;
    use crate::message::status_response;
    use crate::transport::FnTransport;

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Handler for Recording {
        fn send<'a>(
            &'a self,
            request: HttpRequest,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<HttpResponse>> {
            Box::pin(async move {
                self.log.lock().expect("lock").push(format!("{} request", self.label));
                let mut response = next.run(request).await?;
                self.log.lock().expect("lock").push(format!("{} response", self.label));
                response
                    .headers_mut()
                    .append("x-seen-by", HeaderValue::from_static(self.label));
                Ok(response)
            })
        }
    }

    #[tokio::test]
    async fn requests_flow_in_declaration_order_and_responses_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport_log = Arc::clone(&log);
        let transport = FnTransport::new(move |_| {
            let log = Arc::clone(&transport_log);
            async move {
                log.lock().expect("lock").push("transport".to_owned());
                Ok(status_response(StatusCode::OK))
            }
        });

        let handlers: Vec<Arc<dyn Handler>> = vec![
            Arc::new(Recording { label: "A", log: Arc::clone(&log) }),
            Arc::new(Recording { label: "B", log: Arc::clone(&log) }),
        ];
        let chain = HandlerChain::new(
            vec!["A".to_owned(), "B".to_owned()],
            handlers,
            Arc::new(transport),
        );

        let request = Request::get("http://foo.localhost/").body(Bytes::new()).expect("request");
        let response = chain.send(request).await.expect("response");

        assert_eq!(
            *log.lock().expect("lock"),
            vec!["A request", "B request", "transport", "B response", "A response"]
        );
        let seen: Vec<_> = response.headers().get_all("x-seen-by").iter().collect();
        assert_eq!(seen, vec!["B", "A"]);
        assert_eq!(chain.handler_names(), ["A", "B"]);
    }

    #[tokio::test]
    async fn empty_chain_goes_straight_to_transport() {
        let transport = FnTransport::new(|_| async { Ok(status_response(StatusCode::ACCEPTED)) });
        let chain = HandlerChain::new(Vec::new(), Vec::new(), Arc::new(transport));
        let request = Request::get("http://foo.localhost/").body(Bytes::new()).expect("request");

        assert!(chain.is_empty());
        let response = chain.send(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
