//! Authorization header handler
//!
//! Adds `Authorization: {scheme} {credential}` to each request, with the
//! credential produced per attempt by a provider closure. A 401 response
//! is retried with a fresh credential up to the configured limit.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use http::header::AUTHORIZATION;
use http::{HeaderValue, StatusCode};

use crate::config::NamedOptions;
use crate::context::ServiceContext;
use crate::error::{self, BoxError, Result};
use crate::handler::{Handler, HandlerRegistration, Next};
use crate::message::{HttpRequest, HttpResponse, clone_request};

/// Options every authorization header handler reads for its client.
pub trait AuthorizationHeaderOptions: Default + Send + Sync + 'static {
    /// Scheme written before the credential in the header
    fn scheme_name(&self) -> &str;

    /// Whether credentials may be sent over plain `http`
    fn allow_http(&self) -> bool;

    /// Extra attempts after a 401 response
    fn max_retry_unauthorized(&self) -> u32;
}

/// General purpose authorization header options.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AuthorizationHeaderHandlerOptions {
    pub allow_http: bool,
    /// Defaults to `Basic` when unset
    pub scheme_name: Option<String>,
    pub max_retry_unauthorized: Option<u32>,
}

impl AuthorizationHeaderOptions for AuthorizationHeaderHandlerOptions {
    fn scheme_name(&self) -> &str {
        self.scheme_name.as_deref().unwrap_or("Basic")
    }

    fn allow_http(&self) -> bool {
        self.allow_http
    }

    fn max_retry_unauthorized(&self) -> u32 {
        self.max_retry_unauthorized.unwrap_or(0)
    }
}

/// How an authorized exchange ended.
#[derive(Debug)]
pub enum AuthOutcome {
    /// The server answered with something other than 401.
    Authorized(HttpResponse),
    /// Every attempt was rejected; holds the last 401 response.
    ExhaustedRetries(HttpResponse),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        match self {
            Self::Authorized(response) | Self::ExhaustedRetries(response) => response,
        }
    }
}

/// Future returned by a credential provider
pub type CredentialFuture = BoxFuture<'static, std::result::Result<String, BoxError>>;

type CredentialFn<O> = dyn Fn(&str, u32, &O) -> CredentialFuture + Send + Sync;

/// Handler that authorizes requests for one client.
pub struct AuthorizationHeaderHandler<O> {
    client: String,
    options: Arc<O>,
    credential: Arc<CredentialFn<O>>,
}

impl<O: AuthorizationHeaderOptions> AuthorizationHeaderHandler<O> {
    /// `credential` is called with the client name, the 1-based attempt
    /// number and the client's options.
    pub fn new<F, Fut>(client: impl Into<String>, options: Arc<O>, credential: F) -> Self
    where
        F: Fn(&str, u32, &O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
    {
        Self {
            client: client.into(),
            options,
            credential: Arc::new(move |client: &str, attempt: u32, options: &O| {
                Box::pin(credential(client, attempt, options)) as CredentialFuture
            }),
        }
    }

    fn with_provider(client: &str, options: Arc<O>, credential: Arc<CredentialFn<O>>) -> Self {
        Self {
            client: client.to_owned(),
            options,
            credential,
        }
    }

    #[must_use]
    pub fn options(&self) -> &O {
        &self.options
    }

    /// Send `request` with credentials, retrying on 401.
    ///
    /// # Errors
    ///
    /// `InsecureTransmission` before anything is sent when the request is
    /// not `https` and the options do not allow http. Credential provider
    /// failures and downstream errors are returned as they occur.
    pub async fn authorize(&self, request: HttpRequest, next: Next<'_>) -> Result<AuthOutcome> {
        let scheme = self.options.scheme_name();
        let uri_scheme = request.uri().scheme_str().unwrap_or_default();
        if !self.options.allow_http() && uri_scheme != "https" {
            return Err(error::insecure_transmission(uri_scheme).with_client(&self.client));
        }

        let max_attempts = self.options.max_retry_unauthorized().saturating_add(1);
        let mut attempt = 1;
        loop {
            let credential = (self.credential)(&self.client, attempt, &self.options)
                .await
                .map_err(|e| error::callback(&self.client, e))?;
            let mut value =
                HeaderValue::from_str(&format!("{scheme} {credential}")).map_err(error::request)?;
            value.set_sensitive(true);

            let mut outgoing = clone_request(&request);
            outgoing.headers_mut().insert(AUTHORIZATION, value);

            let response = next.run(outgoing).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(AuthOutcome::Authorized(response));
            }

            tracing::trace!(
                target: "httpreg::auth",
                client = %self.client,
                attempt,
                max_attempts,
                scheme = %scheme,
                "Authorization header was rejected"
            );
            if attempt >= max_attempts {
                return Ok(AuthOutcome::ExhaustedRetries(response));
            }
            attempt += 1;
        }
    }
}

impl<O: AuthorizationHeaderOptions> Handler for AuthorizationHeaderHandler<O> {
    fn send<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> BoxFuture<'a, Result<HttpResponse>> {
        Box::pin(async move {
            self.authorize(request, next)
                .await
                .map(AuthOutcome::into_response)
        })
    }
}

impl<O: fmt::Debug> fmt::Debug for AuthorizationHeaderHandler<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationHeaderHandler")
            .field("client", &self.client)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Registration for an authorization header handler reading `NamedOptions<O>`.
///
/// The setup hook puts a `NamedOptions<O>` store into the context if none is
/// there yet; each client's options are then resolved from it by client name
/// when the client's pipeline is built.
pub fn authorization_header_handler<O, F, Fut>(credential: F) -> HandlerRegistration
where
    O: AuthorizationHeaderOptions,
    F: Fn(&str, u32, &O) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
{
    let credential: Arc<CredentialFn<O>> =
        Arc::new(move |client: &str, attempt: u32, options: &O| {
            Box::pin(credential(client, attempt, options)) as CredentialFuture
        });

    HandlerRegistration::new()
        .setup(|ctx: &mut ServiceContext| {
            ctx.get_or_insert_with(NamedOptions::<O>::new);
        })
        .try_factory(move |ctx: &ServiceContext, client: &str| -> std::result::Result<_, BoxError> {
            let named = ctx
                .get::<NamedOptions<O>>()
                .ok_or("authorization options store is missing from the service context")?;
            let options = named.resolve(ctx, client)?;
            Ok(AuthorizationHeaderHandler::with_provider(
                client,
                options,
                Arc::clone(&credential),
            ))
        })
}
