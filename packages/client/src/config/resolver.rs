//! Options resolution for a client name
//!
//! Order: options bound to the exact name, then the version convention (when
//! a constructor is installed), then callbacks that apply to every name.
//! A name none of these cover is an error, never a default client.

use std::fmt;
use std::sync::Arc;

use super::client_options::ClientOptions;
use super::lazy::KeyedLazyConfigurator;
use super::versioning::VersionedNameResolver;
use crate::context::ServiceContext;
use crate::error::{self, Result};

/// Where a name's options came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsSource {
    Explicit,
    Versioned,
    Dynamic,
}

pub struct ClientOptionsResolver {
    configurator: KeyedLazyConfigurator<ClientOptions>,
    versioned: Option<VersionedNameResolver<ClientOptions>>,
}

impl ClientOptionsResolver {
    #[must_use]
    pub fn new(
        configurator: KeyedLazyConfigurator<ClientOptions>,
        versioned: Option<VersionedNameResolver<ClientOptions>>,
    ) -> Self {
        Self {
            configurator,
            versioned,
        }
    }

    /// Which source would configure `name`, if any.
    #[must_use]
    pub fn source_of(&self, name: &str) -> Option<OptionsSource> {
        if self.configurator.is_explicit(name) {
            return Some(OptionsSource::Explicit);
        }
        if self.versioned.is_some() && super::VersionedName::parse(name).is_some() {
            return Some(OptionsSource::Versioned);
        }
        if self.configurator.has_global_callbacks() {
            return Some(OptionsSource::Dynamic);
        }
        None
    }

    /// Resolve the options snapshot for `name`.
    ///
    /// # Errors
    ///
    /// `UnconfiguredClient` when no source covers the name, or the failure of
    /// the callback or constructor that ran.
    pub fn resolve(&self, ctx: &ServiceContext, name: &str) -> Result<Arc<ClientOptions>> {
        match self.source_of(name) {
            Some(OptionsSource::Explicit | OptionsSource::Dynamic) => {
                self.configurator.resolve(ctx, name)
            }
            Some(OptionsSource::Versioned) => self
                .versioned
                .as_ref()
                .and_then(|versioned| versioned.resolve(ctx, name))
                .unwrap_or_else(|| Err(error::unconfigured_client(name))),
            None => {
                tracing::warn!(
                    target: "httpreg::config",
                    client = %name,
                    "Client name is neither registered, versioned nor covered by a dynamic callback"
                );
                Err(error::unconfigured_client(name))
            }
        }
    }

    #[must_use]
    pub fn configurator(&self) -> &KeyedLazyConfigurator<ClientOptions> {
        &self.configurator
    }

    #[must_use]
    pub fn versioned(&self) -> Option<&VersionedNameResolver<ClientOptions>> {
        self.versioned.as_ref()
    }
}

impl fmt::Debug for ClientOptionsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptionsResolver")
            .field("configurator", &self.configurator)
            .field("versioned", &self.versioned)
            .finish()
    }
}
