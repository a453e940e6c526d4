//! Pipeline assembly for a named client
//!
//! Turns the resolved options for a client name into a configured primary
//! transport with the declared handlers composed in front of it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::{ClientOptions, ClientOptionsResolver, ConfigValidator};
use crate::context::ServiceContext;
use crate::error::{self, Result};
use crate::handler::{HandlerChain, HandlerRegistry};
use crate::message::{HttpRequest, HttpResponse};
use crate::transport::PrimaryTransport;

/// A warning raised while building a pipeline.
///
/// Each is also logged at warn level; they are kept on the built pipeline so
/// callers can inspect them without a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDiagnostic {
    /// The transport accepts any server certificate.
    CertificateValidationBypassed,
    /// The client declares no handlers.
    NoHandlersConfigured,
}

/// The result of one pipeline build: options snapshot plus handler chain.
pub struct BuiltPipeline {
    client: String,
    options: Arc<ClientOptions>,
    base_address: Option<Url>,
    chain: HandlerChain,
    diagnostics: Vec<PipelineDiagnostic>,
}

impl BuiltPipeline {
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client
    }

    /// Options snapshot the pipeline was built from
    #[must_use]
    pub fn options(&self) -> &Arc<ClientOptions> {
        &self.options
    }

    #[must_use]
    pub fn base_address(&self) -> Option<&Url> {
        self.base_address.as_ref()
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.options.timeout
    }

    #[must_use]
    pub fn max_response_content_buffer_size(&self) -> Option<u64> {
        self.options.max_response_content_buffer_size
    }

    #[must_use]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[PipelineDiagnostic] {
        &self.diagnostics
    }

    /// Send `request` through the handler chain unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever a handler or the transport fails with.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.chain.send(request).await
    }
}

impl fmt::Debug for BuiltPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltPipeline")
            .field("client", &self.client)
            .field("base_address", &self.base_address.as_ref().map(Url::as_str))
            .field("chain", &self.chain)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// Builds handler pipelines from resolved client options.
#[derive(Clone)]
pub struct ClientOptionsPipeline {
    resolver: Arc<ClientOptionsResolver>,
    registry: Arc<HandlerRegistry>,
    context: Arc<ServiceContext>,
}

impl ClientOptionsPipeline {
    #[must_use]
    pub fn new(
        resolver: Arc<ClientOptionsResolver>,
        registry: Arc<HandlerRegistry>,
        context: Arc<ServiceContext>,
    ) -> Self {
        Self {
            resolver,
            registry,
            context,
        }
    }

    /// Resolve the options snapshot for `name` without building anything.
    ///
    /// # Errors
    ///
    /// See [`ClientOptionsResolver::resolve`].
    pub fn options(&self, name: &str) -> Result<Arc<ClientOptions>> {
        self.resolver.resolve(&self.context, name)
    }

    /// Build the pipeline for `name` on top of `transport`.
    ///
    /// Handlers are created fresh on every call; configuration callbacks run
    /// only the first time a name is resolved.
    ///
    /// # Errors
    ///
    /// `UnconfiguredClient` when nothing configures `name`, `Configuration`
    /// for invalid scalar options, `HandlerNotFound` for an undeclared
    /// handler name, or the failure of a handler factory. No partial chain is
    /// returned.
    pub fn build<T: PrimaryTransport>(&self, name: &str, mut transport: T) -> Result<BuiltPipeline> {
        let options = self.options(name)?;
        options
            .validate()
            .map_err(|e| error::configuration(e).with_client(name))?;
        let base_address = ConfigValidator::parse_base_address(options.base_address.as_deref())
            .map_err(|e| error::configuration(e).with_client(name))?;

        let mut diagnostics = Vec::new();

        transport.set_use_cookies(options.use_cookies);
        transport.set_max_response_buffer_size(options.max_response_content_buffer_size);
        if options.enable_bypass_invalid_certificate {
            transport.accept_invalid_certificates();
            tracing::warn!(
                target: "httpreg::pipeline",
                client = %name,
                "Server certificate validation is disabled for this client"
            );
            diagnostics.push(PipelineDiagnostic::CertificateValidationBypassed);
        }

        if options.handlers.is_empty() {
            tracing::warn!(
                target: "httpreg::pipeline",
                client = %name,
                "Client has no handlers configured"
            );
            diagnostics.push(PipelineDiagnostic::NoHandlersConfigured);
        }

        let mut handlers = Vec::with_capacity(options.handlers.len());
        for handler in &options.handlers {
            tracing::debug!(
                target: "httpreg::pipeline",
                client = %name,
                handler = %handler,
                "Creating handler"
            );
            match self.registry.resolve(handler, &self.context, name) {
                Ok(instance) => handlers.push(instance),
                Err(e) => {
                    if e.is_handler_not_found() {
                        tracing::error!(
                            target: "httpreg::pipeline",
                            client = %name,
                            handler = %handler,
                            "Handler is not registered"
                        );
                    } else {
                        tracing::error!(
                            target: "httpreg::pipeline",
                            client = %name,
                            handler = %handler,
                            error = %e,
                            "Handler factory failed"
                        );
                    }
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            target: "httpreg::pipeline",
            client = %name,
            handlers = handlers.len(),
            "Built client pipeline"
        );

        Ok(BuiltPipeline {
            client: name.to_owned(),
            chain: HandlerChain::new(options.handlers.clone(), handlers, Arc::new(transport)),
            options,
            base_address,
            diagnostics,
        })
    }

    #[must_use]
    pub fn resolver(&self) -> &ClientOptionsResolver {
        &self.resolver
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn context(&self) -> &ServiceContext {
        &self.context
    }
}

impl fmt::Debug for ClientOptionsPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptionsPipeline")
            .field("resolver", &self.resolver)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use futures::future::BoxFuture;
    use http::{Request, StatusCode};

    use super::*;
    use crate::config::KeyedLazyConfigurator;
    use crate::handler::{FnHandler, HandlerRegistration};
    use crate::message::status_response;
    use crate::transport::{
        SupportsCertificateValidationOverride, SupportsCookiePolicy, Transport,
    };

    #[derive(Default)]
    struct Applied {
        cookies: Option<bool>,
        bypass: bool,
        buffer_limit: Option<u64>,
    }

    struct RecordingTransport(Arc<Mutex<Applied>>);

    impl Transport for RecordingTransport {
        fn send(&self, _request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
            Box::pin(async { Ok(status_response(StatusCode::OK)) })
        }

        fn set_max_response_buffer_size(&mut self, limit: Option<u64>) {
            self.0.lock().expect("lock").buffer_limit = limit;
        }
    }

    impl SupportsCookiePolicy for RecordingTransport {
        fn set_use_cookies(&mut self, enabled: bool) {
            self.0.lock().expect("lock").cookies = Some(enabled);
        }
    }

    impl SupportsCertificateValidationOverride for RecordingTransport {
        fn accept_invalid_certificates(&mut self) {
            self.0.lock().expect("lock").bypass = true;
        }
    }

    fn pipeline(
        configure: impl Fn(&mut ClientOptions) + Send + Sync + 'static,
        registry: HandlerRegistry,
    ) -> ClientOptionsPipeline {
        let mut configurator = KeyedLazyConfigurator::<ClientOptions>::new();
        configurator.register_for("foo", move |_, options| configure(options));
        ClientOptionsPipeline::new(
            Arc::new(ClientOptionsResolver::new(configurator, None)),
            Arc::new(registry),
            Arc::new(ServiceContext::new()),
        )
    }

    fn registry_with(names: &[&str]) -> HandlerRegistry {
        let mut ctx = ServiceContext::new();
        let mut registry = HandlerRegistry::new();
        for name in names {
            registry
                .register(
                    *name,
                    HandlerRegistration::new()
                        .factory(|_, _| FnHandler::new(|_| async { Ok(status_response(StatusCode::OK)) })),
                    &mut ctx,
                )
                .expect("registers");
        }
        registry
    }

    #[test]
    fn default_options_leave_certificate_validation_alone() {
        let applied = Arc::new(Mutex::new(Applied::default()));
        let pipeline = pipeline(
            |options| {
                options.add_handler("a");
            },
            registry_with(&["a"]),
        );

        let built = pipeline.build("foo", RecordingTransport(Arc::clone(&applied))).expect("builds");

        let applied = applied.lock().expect("lock");
        assert_eq!(applied.cookies, Some(false));
        assert!(!applied.bypass);
        assert_eq!(applied.buffer_limit, None);
        assert!(built.diagnostics().is_empty());
    }

    #[test]
    fn response_buffer_limit_reaches_transport() {
        let applied = Arc::new(Mutex::new(Applied::default()));
        let pipeline = pipeline(
            |options| {
                options.max_response_content_buffer_size = Some(2048);
                options.add_handler("a");
            },
            registry_with(&["a"]),
        );

        pipeline
            .build("foo", RecordingTransport(Arc::clone(&applied)))
            .expect("builds");

        assert_eq!(applied.lock().expect("lock").buffer_limit, Some(2048));
    }

    #[test]
    fn certificate_bypass_warns_once_per_build() {
        let applied = Arc::new(Mutex::new(Applied::default()));
        let pipeline = pipeline(
            |options| {
                options.enable_bypass_invalid_certificate = true;
                options.use_cookies = true;
                options.add_handler("a");
            },
            registry_with(&["a"]),
        );

        for _ in 0..2 {
            let built = pipeline
                .build("foo", RecordingTransport(Arc::clone(&applied)))
                .expect("builds");
            assert_eq!(
                built.diagnostics(),
                [PipelineDiagnostic::CertificateValidationBypassed]
            );
        }
        let applied = applied.lock().expect("lock");
        assert!(applied.bypass);
        assert_eq!(applied.cookies, Some(true));
    }

    #[test]
    fn empty_handler_list_builds_with_diagnostic() {
        let applied = Arc::new(Mutex::new(Applied::default()));
        let pipeline = pipeline(|_| {}, HandlerRegistry::new());

        let built = pipeline.build("foo", RecordingTransport(applied)).expect("builds");
        assert!(built.chain().is_empty());
        assert_eq!(built.diagnostics(), [PipelineDiagnostic::NoHandlersConfigured]);
    }

    #[test]
    fn missing_handler_fails_whole_build() {
        let applied = Arc::new(Mutex::new(Applied::default()));
        let pipeline = pipeline(
            |options| {
                options.add_handler("a").add_handler("missing").add_handler("b");
            },
            registry_with(&["a", "b"]),
        );

        let err = pipeline.build("foo", RecordingTransport(applied)).err().expect("build fails");
        assert!(err.is_handler_not_found());
        assert_eq!(err.missing_handler(), Some("missing"));
        assert_eq!(err.client(), Some("foo"));
    }

    #[test]
    fn unknown_client_fails_fast() {
        let pipeline = pipeline(|_| {}, HandlerRegistry::new());
        let err = pipeline
            .build("bar", RecordingTransport(Arc::default()))
            .err()
            .expect("unconfigured");
        assert!(err.is_unconfigured_client());
    }

    #[test]
    fn invalid_base_address_is_a_configuration_error() {
        let pipeline = pipeline(
            |options| options.base_address = Some("ftp://foo.localhost".to_owned()),
            HandlerRegistry::new(),
        );
        let err = pipeline
            .build("foo", RecordingTransport(Arc::default()))
            .err()
            .expect("invalid");
        assert!(err.is_configuration());
        assert_eq!(err.client(), Some("foo"));
    }

    #[tokio::test]
    async fn built_chain_keeps_declared_order() {
        let pipeline = pipeline(
            |options| {
                options.add_handler("b").add_handler("a");
                options.base_address = Some("http://foo.localhost/".to_owned());
            },
            registry_with(&["a", "b"]),
        );

        let built = pipeline.build("foo", RecordingTransport(Arc::default())).expect("builds");
        assert_eq!(built.chain().handler_names(), ["b", "a"]);
        assert_eq!(
            built.base_address().map(Url::as_str),
            Some("http://foo.localhost/")
        );

        let request = Request::get("http://foo.localhost/").body(Bytes::new()).expect("request");
        let response = built.send(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
