//! Per-name handler options

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use httpreg_client::config::json;
use httpreg_client::{NamedOptions, ServiceContext};

use crate::builder::core::HttpRegistryBuilder;

impl HttpRegistryBuilder {
    /// Configure handler options of type `T` for every client name.
    ///
    /// Handlers resolve `NamedOptions<T>` from the service context by client
    /// name when a pipeline is built.
    #[must_use]
    pub fn configure_named<T, F>(mut self, configure: F) -> Self
    where
        T: Default + Send + Sync + 'static,
        F: Fn(&ServiceContext, &str, &mut T) + Send + Sync + 'static,
    {
        self.named::<T>().register(configure);
        self
    }

    /// Configure handler options of type `T` for the client called `name`.
    ///
    /// # Examples
    /// ```no_run
    /// use httpreg::{BasicAuthOptions, HttpRegistryBuilder};
    ///
    /// let builder = HttpRegistryBuilder::new().configure_named_for::<BasicAuthOptions, _>(
    ///     "github",
    ///     |_, options| {
    ///         options.username = "octocat".to_owned();
    ///         options.password = "secret".to_owned();
    ///     },
    /// );
    /// ```
    #[must_use]
    pub fn configure_named_for<T, F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        T: Default + Send + Sync + 'static,
        F: Fn(&ServiceContext, &mut T) + Send + Sync + 'static,
    {
        self.named::<T>().register_for(name, configure);
        self
    }

    /// Bind handler options of type `T` for every client from `path(name)`.
    ///
    /// Clients without a section keep `T::default()`.
    #[must_use]
    pub fn bind_named_from_json<T, P>(mut self, root: Value, path: P) -> Self
    where
        T: Default + Serialize + DeserializeOwned + Send + Sync + 'static,
        P: Fn(&str) -> String + Send + Sync + 'static,
    {
        let root = Arc::new(root);
        self.named::<T>().try_register(move |_, name, options| {
            if let Some(section) = json::section(&root, &path(name)) {
                json::bind_into(section, options)?;
            }
            Ok(())
        });
        self
    }

    fn named<T: Default + Send + Sync + 'static>(&mut self) -> &mut NamedOptions<T> {
        self.context.get_or_insert_with(NamedOptions::<T>::new)
    }
}
