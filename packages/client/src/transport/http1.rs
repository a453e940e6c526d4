//! HTTP/1.1 transport over hyper
//!
//! Opens one connection per request, over TCP for `http` and over rustls
//! for `https`. Cookies and certificate validation are controlled through
//! the capability traits so the pipeline can apply client options to it.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::{COOKIE, HOST, SET_COOKIE};
use http::{HeaderValue, Request, Response};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_util::rt::TokioIo;
use once_cell::sync::OnceCell;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::Url;

use super::cookie::Jar;
use super::tls;
use super::{SupportsCertificateValidationOverride, SupportsCookiePolicy, Transport};
use crate::error::{self, Result};
use crate::message::{HttpRequest, HttpResponse};

/// Primary transport speaking HTTP/1.1 with hyper.
pub struct HyperTransport {
    use_cookies: bool,
    accept_invalid_certificates: bool,
    max_response_buffer_size: Option<u64>,
    jar: Jar,
    tls: OnceCell<Arc<ClientConfig>>,
}

impl HyperTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_cookies: false,
            accept_invalid_certificates: false,
            max_response_buffer_size: None,
            jar: Jar::new(),
            tls: OnceCell::new(),
        }
    }

    /// Use `jar` for cookie storage instead of a private one.
    #[must_use]
    pub fn with_cookie_jar(mut self, jar: Jar) -> Self {
        self.jar = jar;
        self
    }

    #[must_use]
    pub fn cookie_jar(&self) -> &Jar {
        &self.jar
    }

    #[must_use]
    pub fn uses_cookies(&self) -> bool {
        self.use_cookies
    }

    #[must_use]
    pub fn accepts_invalid_certificates(&self) -> bool {
        self.accept_invalid_certificates
    }

    #[must_use]
    pub fn max_response_buffer_size(&self) -> Option<u64> {
        self.max_response_buffer_size
    }

    fn tls_config(&self) -> Result<Arc<ClientConfig>> {
        self.tls
            .get_or_try_init(|| tls::client_config(self.accept_invalid_certificates))
            .cloned()
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = Url::parse(&request.uri().to_string()).map_err(error::request)?;
        let secure = match url.scheme() {
            "http" => false,
            "https" => true,
            other => return Err(error::request(format!("unsupported scheme `{other}`"))),
        };
        let host = url
            .host_str()
            .ok_or_else(|| error::request("request URI has no host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_owned();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| error::request("request URI has no port"))?;

        let (mut parts, body) = request.into_parts();
        parts.uri = origin_form(&url).parse().map_err(error::request)?;
        if !parts.headers.contains_key(HOST) {
            let value = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.clone(),
            };
            parts
                .headers
                .insert(HOST, HeaderValue::from_str(&value).map_err(error::request)?);
        }
        if self.use_cookies
            && let Some(cookies) = self.jar.cookies(&url)
        {
            parts.headers.insert(COOKIE, cookies);
        }
        let request = Request::from_parts(parts, Full::new(body));

        tracing::trace!(
            target: "httpreg::transport",
            method = %request.method(),
            url = %url,
            "Dispatching request"
        );

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(error::transport)?;

        let response = if secure {
            let connector = TlsConnector::from(self.tls_config()?);
            let server_name = ServerName::try_from(host).map_err(error::request)?;
            let stream = connector
                .connect(server_name, stream)
                .await
                .map_err(error::transport)?;
            send_over(TokioIo::new(stream), request, self.max_response_buffer_size).await?
        } else {
            send_over(TokioIo::new(stream), request, self.max_response_buffer_size).await?
        };

        if self.use_cookies {
            self.jar
                .set_cookies(response.headers().get_all(SET_COOKIE).iter(), &url);
        }
        Ok(response)
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport")
            .field("use_cookies", &self.use_cookies)
            .field("accept_invalid_certificates", &self.accept_invalid_certificates)
            .field("max_response_buffer_size", &self.max_response_buffer_size)
            .finish_non_exhaustive()
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
        Box::pin(self.dispatch(request))
    }

    fn set_max_response_buffer_size(&mut self, limit: Option<u64>) {
        self.max_response_buffer_size = limit;
    }
}

impl SupportsCookiePolicy for HyperTransport {
    fn set_use_cookies(&mut self, enabled: bool) {
        self.use_cookies = enabled;
    }
}

impl SupportsCertificateValidationOverride for HyperTransport {
    fn accept_invalid_certificates(&mut self) {
        self.accept_invalid_certificates = true;
        self.tls = OnceCell::new();
    }
}

fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}

async fn send_over<I>(
    io: I,
    request: Request<Full<Bytes>>,
    limit: Option<u64>,
) -> Result<HttpResponse>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(error::transport)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(target: "httpreg::transport", error = %e, "Connection closed with error");
        }
    });

    let response = sender.send_request(request).await.map_err(error::transport)?;
    let (parts, body) = response.into_parts();
    let body = match limit {
        Some(limit) => Limited::new(body, usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    error::payload_too_large(limit)
                } else {
                    error::transport(e)
                }
            })?
            .to_bytes(),
        None => body.collect().await.map_err(error::transport)?.to_bytes(),
    };
    Ok(Response::from_parts(parts, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_keeps_path_and_query() {
        let url: Url = "http://foo.localhost:8080/a/b?x=1".parse().expect("url");
        assert_eq!(origin_form(&url), "/a/b?x=1");
        let url: Url = "http://foo.localhost".parse().expect("url");
        assert_eq!(origin_form(&url), "/");
    }

    #[test]
    fn capabilities_update_state() {
        let mut transport = HyperTransport::new();
        assert!(!transport.uses_cookies());
        transport.set_use_cookies(true);
        transport.accept_invalid_certificates();
        transport.set_max_response_buffer_size(Some(1024));
        assert!(transport.uses_cookies());
        assert_eq!(transport.max_response_buffer_size(), Some(1024));
        assert!(transport.accepts_invalid_certificates());
        assert!(transport.tls_config().is_ok());
    }

    #[tokio::test]
    async fn rejects_unsupported_scheme() {
        let transport = HyperTransport::new();
        let request = Request::get("ftp://foo.localhost/file")
            .body(Bytes::new())
            .expect("request");
        let err = transport.send(request).await.expect_err("ftp is not supported");
        assert!(err.is_request());
    }
}
