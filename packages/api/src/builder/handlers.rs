//! Handler registration methods

use httpreg_client::handlers::{BASIC_AUTH_HANDLER, BasicAuthOptions, BasicCredentials, basic_auth_handler};
use httpreg_client::{HandlerRegistration, Result};

use crate::builder::core::HttpRegistryBuilder;

impl HttpRegistryBuilder {
    /// Register a named handler.
    ///
    /// The registration's setup hook runs immediately against the builder's
    /// service context.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a duplicate name or a registration
    /// without a factory.
    ///
    /// # Examples
    /// ```no_run
    /// use httpreg::{FnHandler, HandlerRegistration, HttpRegistryBuilder, StatusCode};
    /// use httpreg::message::status_response;
    ///
    /// # fn run() -> httpreg::Result<()> {
    /// let builder = HttpRegistryBuilder::new().register_handler(
    ///     "teapot",
    ///     HandlerRegistration::new().factory(|_, _| {
    ///         FnHandler::new(|_| async { Ok(status_response(StatusCode::IM_A_TEAPOT)) })
    ///     }),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn register_handler(
        mut self,
        name: impl Into<String>,
        registration: HandlerRegistration,
    ) -> Result<Self> {
        self.registry
            .register(name, registration, &mut self.context)?;
        Ok(self)
    }

    /// Register the basic authentication handler as `BasicAuth`, reading
    /// [`BasicAuthOptions`] per client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `BasicAuth` is already registered.
    pub fn with_basic_auth(self) -> Result<Self> {
        self.with_basic_auth_options::<BasicAuthOptions>()
    }

    /// Register the basic authentication handler with a custom options type.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `BasicAuth` is already registered.
    pub fn with_basic_auth_options<O: BasicCredentials>(self) -> Result<Self> {
        self.register_handler(BASIC_AUTH_HANDLER, basic_auth_handler::<O>())
    }
}
