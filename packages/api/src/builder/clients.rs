//! Client options registration methods

use std::sync::Arc;

use serde_json::Value;

use httpreg_client::config::{ClientOptions, VersionedName, VersionedNameResolver, json};
use httpreg_client::{BoxError, ServiceContext, error};

use crate::builder::core::HttpRegistryBuilder;

impl HttpRegistryBuilder {
    /// Configure every client name on its first request.
    ///
    /// Names not registered explicitly are then accepted and configured by
    /// these callbacks instead of failing as unconfigured.
    #[must_use]
    pub fn configure_clients<F>(mut self, configure: F) -> Self
    where
        F: Fn(&ServiceContext, &str, &mut ClientOptions) + Send + Sync + 'static,
    {
        self.clients.register(configure);
        self
    }

    /// Fallible variant of [`configure_clients`](Self::configure_clients).
    #[must_use]
    pub fn try_configure_clients<F>(mut self, configure: F) -> Self
    where
        F: Fn(&ServiceContext, &str, &mut ClientOptions) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.clients.try_register(configure);
        self
    }

    /// Configure the client called `name`.
    ///
    /// # Examples
    /// ```no_run
    /// use httpreg::HttpRegistryBuilder;
    ///
    /// let builder = HttpRegistryBuilder::new().configure_client("github", |_, options| {
    ///     options.base_address = Some("https://api.github.com/".to_owned());
    ///     options.add_handler("BasicAuth");
    /// });
    /// ```
    #[must_use]
    pub fn configure_client<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: Fn(&ServiceContext, &mut ClientOptions) + Send + Sync + 'static,
    {
        self.clients.register_for(name, configure);
        self
    }

    /// Fallible variant of [`configure_client`](Self::configure_client).
    #[must_use]
    pub fn try_configure_client<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: Fn(&ServiceContext, &mut ClientOptions) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.clients.try_register_for(name, configure);
        self
    }

    /// Derive options for unregistered `<base>-<tag>` names with `construct`.
    ///
    /// Called at most once per exact name; explicit registrations always win.
    #[must_use]
    pub fn versioned<F>(mut self, construct: F) -> Self
    where
        F: Fn(&ServiceContext, &VersionedName<'_>) -> Result<ClientOptions, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.versioned = Some(VersionedNameResolver::new(construct));
        self
    }

    /// Bind every client's options from the JSON section at `path(name)`.
    ///
    /// Paths use `:` separators, e.g. `http_clients:{name}`. A name without
    /// a section fails as unconfigured rather than falling back to defaults.
    #[must_use]
    pub fn bind_clients_from_json<P>(self, root: Value, path: P) -> Self
    where
        P: Fn(&str) -> String + Send + Sync + 'static,
    {
        let root = Arc::new(root);
        self.try_configure_clients(move |_, name, options| {
            let path = path(name);
            let section = json::section(&root, &path)
                .ok_or_else(|| {
                    tracing::debug!(
                        target: "httpreg::config",
                        client = %name,
                        path = %path,
                        "No configuration section for client"
                    );
                    error::unconfigured_client(name)
                })?;
            json::bind_into(section, options)?;
            Ok(())
        })
    }

    /// Bind the client called `name` from `section`.
    #[must_use]
    pub fn bind_client_from_json(self, name: impl Into<String>, section: Value) -> Self {
        self.try_configure_client(name, move |_, options| {
            json::bind_into(&section, options)?;
            Ok(())
        })
    }
}
