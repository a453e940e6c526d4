//! Cookie storage for transports with cookies enabled

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use http::HeaderValue;
use url::Url;

/// Shared cookie store backed by `cookie_store`.
///
/// Clones share the same underlying store.
#[derive(Clone, Default)]
pub struct Jar(Arc<RwLock<cookie_store::CookieStore>>);

impl Jar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single `Set-Cookie` style string as if `url` had sent it.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        let cookies = cookie::Cookie::parse(cookie)
            .ok()
            .map(cookie::Cookie::into_owned)
            .into_iter();
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .store_response_cookies(cookies, url);
    }

    /// Store every parseable `Set-Cookie` header value received from `url`.
    pub fn set_cookies<'a>(&self, headers: impl Iterator<Item = &'a HeaderValue>, url: &Url) {
        let cookies: Vec<_> = headers
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| cookie::Cookie::parse(value).ok())
            .map(cookie::Cookie::into_owned)
            .collect();
        if cookies.is_empty() {
            return;
        }
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .store_response_cookies(cookies.into_iter(), url);
    }

    /// The `Cookie` header value to send to `url`, if any cookies match.
    #[must_use]
    pub fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let joined = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        if joined.is_empty() {
            return None;
        }
        HeaderValue::from_str(&joined).ok()
    }
}

impl fmt::Debug for Jar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jar").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use http::header::SET_COOKIE;
    use http::HeaderMap;

    use super::*;

    #[test]
    fn stores_and_replays_cookies_for_matching_url() {
        let url: Url = "http://foo.localhost/".parse().expect("url");
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("session=abc; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark"));

        let jar = Jar::new();
        jar.set_cookies(headers.get_all(SET_COOKIE).iter(), &url);

        let value = jar.cookies(&url).expect("cookies stored");
        let value = value.to_str().expect("ascii");
        assert!(value.contains("session=abc"));
        assert!(value.contains("theme=dark"));

        let other: Url = "http://bar.localhost/".parse().expect("url");
        assert!(jar.cookies(&other).is_none());
    }

    #[test]
    fn clones_share_the_store() {
        let url: Url = "http://foo.localhost/".parse().expect("url");
        let jar = Jar::new();
        let clone = jar.clone();
        jar.add_cookie_str("id=1", &url);
        assert!(clone.cookies(&url).is_some());
    }
}
