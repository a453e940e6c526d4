//! Basic authentication

use std::borrow::Cow;
use std::fmt;
use std::io::Write;

use base64::prelude::BASE64_STANDARD;
use base64::{Engine, write::EncoderStringWriter};
use http::HeaderValue;
use serde::{Deserialize, Serialize};

use super::authorization::{AuthorizationHeaderOptions, authorization_header_handler};
use crate::error::{self, Result};
use crate::handler::HandlerRegistration;

/// Name the basic authentication handler is registered under
pub const BASIC_AUTH_HANDLER: &str = "BasicAuth";

/// Options that carry a username and a password.
///
/// Implement this on your own options type to compute the password instead
/// of storing it, e.g. by reading it from a secret store.
pub trait BasicCredentials: AuthorizationHeaderOptions {
    fn username(&self) -> &str;
    fn password(&self) -> Cow<'_, str>;
}

/// Per-client basic authentication options.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuthOptions {
    pub username: String,
    pub password: String,
    pub allow_http: bool,
    pub max_retry_unauthorized: Option<u32>,
    pub scheme_name: String,
}

impl Default for BasicAuthOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            allow_http: false,
            max_retry_unauthorized: None,
            scheme_name: "Basic".to_owned(),
        }
    }
}

impl BasicAuthOptions {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for BasicAuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthOptions")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("allow_http", &self.allow_http)
            .field("max_retry_unauthorized", &self.max_retry_unauthorized)
            .field("scheme_name", &self.scheme_name)
            .finish()
    }
}

impl AuthorizationHeaderOptions for BasicAuthOptions {
    fn scheme_name(&self) -> &str {
        &self.scheme_name
    }

    fn allow_http(&self) -> bool {
        self.allow_http
    }

    fn max_retry_unauthorized(&self) -> u32 {
        self.max_retry_unauthorized.unwrap_or(0)
    }
}

impl BasicCredentials for BasicAuthOptions {
    fn username(&self) -> &str {
        &self.username
    }

    fn password(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.password)
    }
}

/// Encode `username:password` as base64.
#[must_use]
pub fn encode_basic_auth(username: &str, password: &str) -> String {
    let mut encoder = EncoderStringWriter::new(&BASE64_STANDARD);
    // Writes into a `String` buffer never fail.
    let _ = write!(encoder, "{username}:{password}");
    encoder.into_inner()
}

/// Decode a base64 `username:password` credential.
///
/// # Errors
///
/// Returns a request error for invalid base64, invalid UTF-8 or a missing `:`.
pub fn decode_basic_auth(encoded: &str) -> Result<(String, String)> {
    let decoded = BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| error::request("invalid base64 in basic credential"))?;
    let credentials = String::from_utf8(decoded)
        .map_err(|_| error::request("invalid UTF-8 in basic credential"))?;
    let (username, password) = credentials
        .split_once(':')
        .ok_or_else(|| error::request("basic credential has no `:` separator"))?;
    Ok((username.to_owned(), password.to_owned()))
}

/// Build a sensitive `Basic` authorization header value.
///
/// # Errors
///
/// Returns a request error if the encoded value is not a valid header value.
pub fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue> {
    let value = format!("Basic {}", encode_basic_auth(username, password));
    let mut header = HeaderValue::from_str(&value).map_err(error::request)?;
    header.set_sensitive(true);
    Ok(header)
}

/// Registration for the basic authentication handler reading `NamedOptions<O>`.
///
/// Register it under [`BASIC_AUTH_HANDLER`] and configure `NamedOptions<O>`
/// per client name.
pub fn basic_auth_handler<O: BasicCredentials>() -> HandlerRegistration {
    authorization_header_handler::<O, _, _>(|_, _, options: &O| {
        let credential = encode_basic_auth(options.username(), &options.password());
        async move { Ok(credential) }
    })
}
