//! Common imports for registering and using named clients

pub use crate::config::{
    ClientOptions, ClientOptionsResolver, FactoryConfig, KeyedLazyConfigurator, NamedOptions,
    VersionedName, VersionedNameResolver,
};
pub use crate::context::ServiceContext;
pub use crate::error::{BoxError, Error, Result};
pub use crate::factory::{ClientFactory, ClientHandle};
pub use crate::handler::{FnHandler, Handler, HandlerRegistration, HandlerRegistry, Next};
pub use crate::handlers::{BASIC_AUTH_HANDLER, BasicAuthOptions, basic_auth_handler};
pub use crate::message::{HttpRequest, HttpResponse};
pub use crate::pipeline::ClientOptionsPipeline;
pub use crate::transport::{FnTransport, HyperTransport};

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
