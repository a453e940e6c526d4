//! Basic authentication through the registry builder

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use http::header::AUTHORIZATION;
use serde_json::json;

use httpreg::handlers::encode_basic_auth;
use httpreg::message::status_response;
use httpreg::{
    AuthorizationHeaderOptions, BasicAuthOptions, BasicCredentials, ClientFactory, FnTransport,
    HttpRegistry, HttpRequest, StatusCode,
};

type Seen = Arc<Mutex<Vec<Option<String>>>>;

fn recording_transport(seen: &Seen) -> FnTransport {
    let seen = Arc::clone(seen);
    FnTransport::new(move |request: HttpRequest| {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        seen.lock().expect("lock").push(header);
        async { Ok(status_response(StatusCode::OK)) }
    })
}

fn build(builder: httpreg::HttpRegistryBuilder, seen: &Seen) -> ClientFactory<FnTransport> {
    let transport = recording_transport(seen);
    builder
        .build_with_transport(move |_| transport.clone())
        .expect("builds")
}

fn expected(user: &str, pass: &str) -> Option<String> {
    Some(format!("Basic {}", encode_basic_auth(user, pass)))
}

#[tokio::test]
async fn test_each_client_sends_its_own_credentials() {
    let seen = Seen::default();
    let builder = HttpRegistry::builder()
        .with_basic_auth()
        .expect("registers")
        .configure_clients(|_, name, options| {
            options.base_address = Some(format!("https://{name}.localhost/"));
            options.add_handler("BasicAuth");
        })
        .configure_named_for::<BasicAuthOptions, _>("foo", |_, options| {
            options.username = "foo-user".to_owned();
            options.password = "foo-pass".to_owned();
        })
        .configure_named_for::<BasicAuthOptions, _>("bar", |_, options| {
            options.username = "bar-user".to_owned();
            options.password = "bar-pass".to_owned();
        });
    let factory = build(builder, &seen);

    factory.client("foo").expect("foo").get("/").await.expect("foo response");
    factory.client("bar").expect("bar").get("/").await.expect("bar response");

    assert_eq!(
        *seen.lock().expect("lock"),
        vec![expected("foo-user", "foo-pass"), expected("bar-user", "bar-pass")]
    );
}

#[tokio::test]
async fn test_credentials_refused_over_plain_http() {
    let seen = Seen::default();
    let builder = HttpRegistry::builder()
        .with_basic_auth()
        .expect("registers")
        .configure_client("foo", |_, options| {
            options.base_address = Some("http://foo.localhost/".to_owned());
            options.add_handler("BasicAuth");
        })
        .configure_client("bar", |_, options| {
            options.base_address = Some("http://bar.localhost/".to_owned());
            options.add_handler("BasicAuth");
        })
        .configure_named_for::<BasicAuthOptions, _>("bar", |_, options| {
            options.allow_http = true;
        });
    let factory = build(builder, &seen);

    let err = factory
        .client("foo")
        .expect("foo")
        .get("/")
        .await
        .expect_err("insecure");
    assert!(err.is_insecure_transmission());
    assert!(seen.lock().expect("lock").is_empty());

    let response = factory.client("bar").expect("bar").get("/").await.expect("allowed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[derive(Default)]
struct VaultOptions {
    username: String,
    secret_ref: String,
}

impl AuthorizationHeaderOptions for VaultOptions {
    fn scheme_name(&self) -> &str {
        "Basic"
    }

    fn allow_http(&self) -> bool {
        false
    }

    fn max_retry_unauthorized(&self) -> u32 {
        0
    }
}

impl BasicCredentials for VaultOptions {
    fn username(&self) -> &str {
        &self.username
    }

    fn password(&self) -> Cow<'_, str> {
        Cow::Owned(format!("resolved-{}", self.secret_ref))
    }
}

#[tokio::test]
async fn test_custom_options_type_supplies_password() {
    let seen = Seen::default();
    let builder = HttpRegistry::builder()
        .with_basic_auth_options::<VaultOptions>()
        .expect("registers")
        .configure_client("foo", |_, options| {
            options.base_address = Some("https://foo.localhost/".to_owned());
            options.add_handler("BasicAuth");
        })
        .configure_named_for::<VaultOptions, _>("foo", |_, options| {
            options.username = "svc".to_owned();
            options.secret_ref = "foo-api".to_owned();
        });
    let factory = build(builder, &seen);

    factory.client("foo").expect("foo").get("/").await.expect("response");
    assert_eq!(*seen.lock().expect("lock"), vec![expected("svc", "resolved-foo-api")]);
}

#[tokio::test]
async fn test_clients_and_credentials_bind_from_json() {
    let config = json!({
        "http_clients": {
            "foo": {
                "base_address": "https://foo.localhost/",
                "timeout_ms": 5000,
                "handlers": ["BasicAuth"],
                "BasicAuth": { "username": "json-user", "password": "json-pass" }
            }
        }
    });

    let seen = Seen::default();
    let builder = HttpRegistry::builder()
        .with_basic_auth()
        .expect("registers")
        .bind_clients_from_json(config.clone(), |name| format!("http_clients:{name}"))
        .bind_named_from_json::<BasicAuthOptions, _>(config, |name| {
            format!("http_clients:{name}:BasicAuth")
        });
    let factory = build(builder, &seen);

    let client = factory.client("foo").expect("bound");
    assert_eq!(client.options().timeout, Some(std::time::Duration::from_secs(5)));
    client.get("/").await.expect("response");
    assert_eq!(*seen.lock().expect("lock"), vec![expected("json-user", "json-pass")]);

    let err = factory.client("missing").expect_err("no section");
    assert!(err.is_unconfigured_client());
    assert_eq!(err.client(), Some("missing"));
    assert_eq!(factory.active_len(), 0);
}

#[test]
fn test_duplicate_handler_registration_is_rejected() {
    let err = HttpRegistry::builder()
        .with_basic_auth()
        .expect("first")
        .with_basic_auth()
        .expect_err("duplicate");
    assert!(err.is_configuration());
}
