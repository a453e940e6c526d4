//! Client handles returned by the factory

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Uri};
use url::Url;

use crate::config::ClientOptions;
use crate::error::{self, Result};
use crate::message::{HttpRequest, HttpResponse};
use crate::pipeline::{BuiltPipeline, PipelineDiagnostic};
use crate::stats::FactoryStats;

/// A named client bound to one built pipeline.
///
/// Cheap to clone. A handle keeps using the pipeline it was created with
/// even after the factory rebuilds that name; ask the factory again to pick
/// up a rebuilt pipeline.
#[derive(Clone)]
pub struct ClientHandle {
    pipeline: Arc<BuiltPipeline>,
    stats: Arc<FactoryStats>,
}

impl ClientHandle {
    pub(crate) fn new(pipeline: Arc<BuiltPipeline>, stats: Arc<FactoryStats>) -> Self {
        Self { pipeline, stats }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.pipeline.client_name()
    }

    #[must_use]
    pub fn base_address(&self) -> Option<&Url> {
        self.pipeline.base_address()
    }

    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        self.pipeline.options()
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<BuiltPipeline> {
        &self.pipeline
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[PipelineDiagnostic] {
        self.pipeline.diagnostics()
    }

    /// Send `request` through the client's handlers.
    ///
    /// A relative URI is resolved against the base address. The client
    /// timeout covers the whole chain, retries included.
    ///
    /// # Errors
    ///
    /// `Request` for a relative URI without a base address, `Timeout`,
    /// `PayloadTooLarge` when the body exceeds the buffer limit, or any
    /// handler or transport error.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.counted(self.dispatch(request)).await
    }

    /// Send a GET for `uri`, which may be relative to the base address.
    ///
    /// # Errors
    ///
    /// See [`ClientHandle::send`].
    pub async fn get(&self, uri: &str) -> Result<HttpResponse> {
        self.counted(async {
            let uri = self.resolve_uri(uri)?;
            let request = Request::get(uri).body(Bytes::new()).map_err(error::request)?;
            self.dispatch(request).await
        })
        .await
    }

    async fn counted<F>(&self, request: F) -> Result<HttpResponse>
    where
        F: Future<Output = Result<HttpResponse>>,
    {
        self.stats.record_request();
        let result = request.await;
        if result.is_err() {
            self.stats.record_request_failure();
        }
        result
    }

    async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if request.uri().scheme().is_none() {
            let uri = self.resolve_uri(&request.uri().to_string())?;
            *request.uri_mut() = uri;
        }

        let response = match self.pipeline.timeout() {
            Some(limit) => tokio::time::timeout(limit, self.pipeline.send(request))
                .await
                .map_err(|_| error::timeout(self.name()))??,
            None => self.pipeline.send(request).await?,
        };

        if let Some(limit) = self.pipeline.max_response_content_buffer_size()
            && u64::try_from(response.body().len()).unwrap_or(u64::MAX) > limit
        {
            return Err(error::payload_too_large(limit).with_client(self.name()));
        }
        Ok(response)
    }

    fn resolve_uri(&self, uri: &str) -> Result<Uri> {
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_address().ok_or_else(|| {
                    error::request(format!("relative URI `{uri}` needs a base address"))
                        .with_client(self.name())
                })?;
                base.join(uri).map_err(error::request)?
            }
            Err(e) => return Err(error::request(e)),
        };
        url.as_str().parse().map_err(error::request)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("name", &self.name())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
