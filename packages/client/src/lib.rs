//! # httpreg client core
//!
//! Named outbound HTTP clients assembled from lazily resolved, per-name
//! configuration.
//!
//! A client name resolves to a [`ClientOptions`] snapshot exactly once, even
//! when many tasks ask for it at the same time. The options list handler names;
//! each is looked up in a [`HandlerRegistry`] and instantiated for that client,
//! so one handler implementation can serve many clients with different
//! per-name options. The handlers are composed in declaration order in front
//! of a primary transport, and the [`ClientFactory`] caches the result for a
//! bounded handler lifetime.
//!
//! ## Features
//!
//! - **Configure on first request** with [`KeyedLazyConfigurator`], once per name
//! - **Version-suffix fallback** for names like `billing-v2` that were never registered
//! - **Named handler registry** with setup hooks and per-client options
//! - **Compile-time transport capabilities** for cookies and certificate validation
//! - **Authorization handlers** with a bounded retry on 401
//! - **hyper + rustls** HTTP/1.1 transport
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use httpreg_client::prelude::*;
//!
//! # async fn run() -> httpreg_client::Result<()> {
//! let mut configurator = KeyedLazyConfigurator::<ClientOptions>::new();
//! configurator.register_for("github", |_, options| {
//!     options.base_address = Some("https://api.github.com/".to_owned());
//! });
//!
//! let pipeline = ClientOptionsPipeline::new(
//!     Arc::new(ClientOptionsResolver::new(configurator, None)),
//!     Arc::new(HandlerRegistry::new()),
//!     Arc::new(ServiceContext::new()),
//! );
//! let factory = ClientFactory::new(pipeline, FactoryConfig::default(), |_| HyperTransport::new())?;
//!
//! let response = factory.client("github")?.get("zen").await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod handler;
pub mod handlers;
pub mod message;
pub mod pipeline;
pub mod prelude;
pub mod stats;
pub mod transport;

pub use config::{
    ClientOptions, ClientOptionsResolver, FactoryConfig, KeyedLazyConfigurator, NamedOptions,
    VersionedName, VersionedNameResolver,
};
pub use context::ServiceContext;
pub use error::{BoxError, Error, Result};
pub use factory::{ClientFactory, ClientHandle};
pub use handler::{FnHandler, Handler, HandlerChain, HandlerRegistration, HandlerRegistry, Next};
pub use message::{HttpRequest, HttpResponse};
pub use pipeline::{BuiltPipeline, ClientOptionsPipeline, PipelineDiagnostic};
pub use stats::{FactoryStats, FactoryStatsSnapshot};
pub use transport::{
    FnTransport, HyperTransport, PrimaryTransport, SupportsCertificateValidationOverride,
    SupportsCookiePolicy, Transport,
};

pub use url::Url;
