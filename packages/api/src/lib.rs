//! httpreg public API
//!
//! Register named HTTP clients, the handlers their pipelines are built from
//! and the per-name options those handlers read, then seal everything into a
//! factory that builds each client on its first request.
//!
//! ```no_run
//! use httpreg::{HttpRegistry, BasicAuthOptions};
//!
//! # async fn run() -> httpreg::Result<()> {
//! let factory = HttpRegistry::builder()
//!     .with_basic_auth()?
//!     .configure_client("github", |_, options| {
//!         options.base_address = Some("https://api.github.com/".to_owned());
//!         options.add_handler("BasicAuth");
//!     })
//!     .configure_named_for::<BasicAuthOptions, _>("github", |_, options| {
//!         options.username = "octocat".to_owned();
//!         options.password = "secret".to_owned();
//!     })
//!     .build()?;
//!
//! let response = factory.client("github")?.get("user").await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::*;

pub use httpreg_client::handlers::{
    AuthorizationHeaderHandlerOptions, AuthorizationHeaderOptions, BASIC_AUTH_HANDLER,
    BasicAuthOptions, BasicCredentials, authorization_header_handler, basic_auth_handler,
};
pub use httpreg_client::{
    BoxError, BuiltPipeline, ClientFactory, ClientHandle, ClientOptions, Error, FactoryConfig,
    FnHandler, FnTransport, Handler, HandlerRegistration, HttpRequest, HttpResponse,
    HyperTransport, NamedOptions, Next, PipelineDiagnostic, Result, ServiceContext, VersionedName,
};
pub use httpreg_client::{config, error, handler, handlers, message, transport};

pub use http::{HeaderValue, Method, StatusCode};

/// Main entry point for registering named clients
pub struct HttpRegistry;

impl HttpRegistry {
    /// Start the registration phase
    #[must_use]
    pub fn builder() -> HttpRegistryBuilder {
        HttpRegistryBuilder::new()
    }
}
