//! Core `HttpRegistryBuilder` structure
//!
//! Holds everything collected during the registration phase. `build` seals
//! the handler registry, freezes the service context and hands both to a
//! `ClientFactory`; nothing can be registered after that.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use httpreg_client::config::{
    ClientOptions, ClientOptionsResolver, FactoryConfig, KeyedLazyConfigurator,
    VersionedNameResolver,
};
use httpreg_client::{
    ClientFactory, ClientOptionsPipeline, HandlerRegistry, HyperTransport, PrimaryTransport,
    Result, ServiceContext,
};

/// Registration-phase builder for named HTTP clients.
pub struct HttpRegistryBuilder {
    pub(crate) context: ServiceContext,
    pub(crate) registry: HandlerRegistry,
    pub(crate) clients: KeyedLazyConfigurator<ClientOptions>,
    pub(crate) versioned: Option<VersionedNameResolver<ClientOptions>>,
    pub(crate) config: FactoryConfig,
}

impl Default for HttpRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: ServiceContext::new(),
            registry: HandlerRegistry::new(),
            clients: KeyedLazyConfigurator::new(),
            versioned: None,
            config: FactoryConfig::default(),
        }
    }

    /// Reuse pipelines for `lifetime` before rebuilding them.
    #[must_use]
    pub fn handler_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.handler_lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Mutable access to the service context for inserting shared services.
    pub fn context_mut(&mut self) -> &mut ServiceContext {
        &mut self.context
    }

    /// Seal the registration phase into a factory using [`HyperTransport`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the factory configuration is invalid.
    pub fn build(self) -> Result<ClientFactory<HyperTransport>> {
        self.build_with_transport(|_| HyperTransport::new())
    }

    /// Seal the registration phase into a factory that creates its primary
    /// transports with `transport`, called once per pipeline build.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the factory configuration is invalid.
    pub fn build_with_transport<T, F>(self, transport: F) -> Result<ClientFactory<T>>
    where
        T: PrimaryTransport,
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        let Self {
            context,
            mut registry,
            clients,
            versioned,
            config,
        } = self;

        registry.seal();
        tracing::debug!(
            target: "httpreg::registry",
            handlers = registry.len(),
            callbacks = clients.callback_count(),
            versioned = versioned.is_some(),
            "Sealed client registry"
        );

        let pipeline = ClientOptionsPipeline::new(
            Arc::new(ClientOptionsResolver::new(clients, versioned)),
            Arc::new(registry),
            Arc::new(context),
        );
        ClientFactory::new(pipeline, config, transport)
    }
}

impl fmt::Debug for HttpRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRegistryBuilder")
            .field("registry", &self.registry)
            .field("clients", &self.clients)
            .field("versioned", &self.versioned.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
