//! Named handler registrations

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::config::ConfigValidator;
use crate::context::ServiceContext;
use crate::error::{self, BoxError, Result};

use super::Handler;

type FactoryFn =
    dyn Fn(&ServiceContext, &str) -> std::result::Result<Arc<dyn Handler>, BoxError> + Send + Sync;
type SetupFn = dyn FnOnce(&mut ServiceContext) + Send;

/// How to build one named handler, plus an optional one-time setup hook.
///
/// The factory receives the service context and the name of the client
/// whose pipeline is being built, so a single handler implementation can
/// look up different options per client.
#[derive(Default)]
#[must_use]
pub struct HandlerRegistration {
    factory: Option<Box<FactoryFn>>,
    setup: Option<Box<SetupFn>>,
}

impl HandlerRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an infallible handler factory.
    pub fn factory<F, H>(mut self, f: F) -> Self
    where
        F: Fn(&ServiceContext, &str) -> H + Send + Sync + 'static,
        H: Handler + 'static,
    {
        self.factory = Some(Box::new(move |ctx: &ServiceContext, client: &str| {
            Ok(Arc::new(f(ctx, client)) as Arc<dyn Handler>)
        }));
        self
    }

    /// Set a handler factory that can fail, e.g. when the handler's options are missing.
    pub fn try_factory<F, H, E>(mut self, f: F) -> Self
    where
        F: Fn(&ServiceContext, &str) -> std::result::Result<H, E> + Send + Sync + 'static,
        H: Handler + 'static,
        E: Into<BoxError>,
    {
        self.factory = Some(Box::new(move |ctx: &ServiceContext, client: &str| {
            f(ctx, client)
                .map(|handler| Arc::new(handler) as Arc<dyn Handler>)
                .map_err(Into::into)
        }));
        self
    }

    /// Run `f` once, when the registration is accepted.
    ///
    /// Handlers use this to put their per-name options store into the context.
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceContext) + Send + 'static,
    {
        self.setup = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("factory", &self.factory.is_some())
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

/// Handler name to factory map, closed for registration once sealed.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, Box<FactoryFn>>,
    sealed: bool,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `registration` under `name`.
    ///
    /// The setup hook, if any, runs against `ctx` before this returns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the registry is sealed, the name is
    /// blank or already taken, or the registration has no factory. The first
    /// registration for a name is kept.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        registration: HandlerRegistration,
        ctx: &mut ServiceContext,
    ) -> Result<()> {
        let name = name.into();
        if self.sealed {
            return Err(error::configuration(format!(
                "handler registry is sealed; cannot register `{name}`"
            )));
        }
        ConfigValidator::validate_handler_name(&name).map_err(error::configuration)?;
        if self.factories.contains_key(&name) {
            return Err(error::configuration(format!(
                "handler `{name}` is already registered"
            )));
        }
        let HandlerRegistration { factory, setup } = registration;
        let Some(factory) = factory else {
            return Err(error::configuration(format!(
                "handler `{name}` was registered without a factory"
            )));
        };

        if let Some(setup) = setup {
            setup(ctx);
        }
        tracing::debug!(target: "httpreg::registry", handler = %name, "Registered handler");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Close the registry; later `register` calls fail.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Build a fresh instance of `handler` for `client`.
    ///
    /// Nothing is cached here; every call runs the factory.
    ///
    /// # Errors
    ///
    /// Returns `HandlerNotFound` naming both the handler and the client when
    /// `handler` is unknown, or `HandlerFactory` when the factory fails.
    pub fn resolve(
        &self,
        handler: &str,
        ctx: &ServiceContext,
        client: &str,
    ) -> Result<Arc<dyn Handler>> {
        let factory = self
            .factories
            .get(handler)
            .ok_or_else(|| error::handler_not_found(handler, client))?;
        factory(ctx, client).map_err(|e| error::handler_factory(handler, client, e))
    }

    #[must_use]
    pub fn contains(&self, handler: &str) -> bool {
        self.factories.contains_key(handler)
    }

    /// Registered handler names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .field("sealed", &self.sealed)
            .finish()
    }
}
