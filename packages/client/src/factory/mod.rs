//! Client factory
//!
//! Hands out clients by name. The first request for a name builds its
//! pipeline; the built pipeline is reused until its handler lifetime runs
//! out, after which the next request builds a fresh one. Rebuilding creates
//! new handler instances and a new transport but never re-runs the name's
//! configuration callbacks.

pub mod handle;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::{ClientOptions, FactoryConfig};
use crate::error::{self, Result};
use crate::pipeline::{BuiltPipeline, ClientOptionsPipeline};
use crate::stats::{FactoryStats, FactoryStatsSnapshot};
use crate::transport::PrimaryTransport;

pub use handle::ClientHandle;

type TransportFn<T> = dyn Fn(&str) -> T + Send + Sync;

struct ActiveEntry {
    pipeline: Arc<BuiltPipeline>,
    expires_at: Instant,
}

type Slot = Arc<Mutex<Option<ActiveEntry>>>;

/// Builds and caches client pipelines by name.
pub struct ClientFactory<T> {
    pipeline: ClientOptionsPipeline,
    transport: Arc<TransportFn<T>>,
    active: DashMap<String, Slot>,
    config: FactoryConfig,
    stats: Arc<FactoryStats>,
}

impl<T: PrimaryTransport> ClientFactory<T> {
    /// Create a factory that builds a fresh transport with `transport` for every pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new<F>(pipeline: ClientOptionsPipeline, config: FactoryConfig, transport: F) -> Result<Self>
    where
        F: Fn(&str) -> T + Send + Sync + 'static,
    {
        config.validate().map_err(error::configuration)?;
        Ok(Self {
            pipeline,
            transport: Arc::new(transport),
            active: DashMap::new(),
            config,
            stats: Arc::new(FactoryStats::new()),
        })
    }

    /// Get a client for `name`, building its pipeline if needed.
    ///
    /// # Errors
    ///
    /// Returns the pipeline build failure for `name`. Other names are unaffected.
    pub fn client(&self, name: &str) -> Result<ClientHandle> {
        let pipeline = self.active_pipeline(name)?;
        self.stats.record_client();
        Ok(ClientHandle::new(pipeline, Arc::clone(&self.stats)))
    }

    /// The current pipeline for `name`, rebuilt when its lifetime has elapsed.
    ///
    /// # Errors
    ///
    /// See [`ClientOptionsPipeline::build`].
    pub fn active_pipeline(&self, name: &str) -> Result<Arc<BuiltPipeline>> {
        let slot = self.slot(name);
        let mut active = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(entry) = active.as_ref() {
            if entry.expires_at > now {
                return Ok(Arc::clone(&entry.pipeline));
            }
            tracing::debug!(target: "httpreg::factory", client = %name, "Handler lifetime elapsed");
            self.stats.record_expiration();
        }
        *active = None;

        match self.pipeline.build(name, (self.transport)(name)) {
            Ok(built) => {
                let lifetime = built
                    .options()
                    .handler_lifetime
                    .unwrap_or(self.config.handler_lifetime);
                let built = Arc::new(built);
                *active = Some(ActiveEntry {
                    pipeline: Arc::clone(&built),
                    expires_at: now + lifetime,
                });
                self.stats.record_build();
                tracing::debug!(
                    target: "httpreg::factory",
                    client = %name,
                    lifetime_ms = u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX),
                    "Cached client pipeline"
                );
                Ok(built)
            }
            Err(e) => {
                self.stats.record_build_failure();
                drop(active);
                // Only the map and this call hold the slot, so no caller is queued on it.
                self.active.remove_if(name, |_, current| {
                    Arc::ptr_eq(current, &slot) && Arc::strong_count(current) == 2
                });
                Err(e)
            }
        }
    }

    /// Drop the cached pipeline for `name` so the next request rebuilds it.
    ///
    /// Returns whether a pipeline was cached.
    pub fn expire(&self, name: &str) -> bool {
        let Some(slot) = self.active.get(name).map(|slot| Arc::clone(slot.value())) else {
            return false;
        };
        let expired = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if expired {
            self.stats.record_expiration();
            tracing::debug!(target: "httpreg::factory", client = %name, "Client pipeline expired");
        }
        expired
    }

    /// Resolved options for `name`, without building a pipeline.
    ///
    /// # Errors
    ///
    /// `UnconfiguredClient` or a configuration callback failure.
    pub fn options(&self, name: &str) -> Result<Arc<ClientOptions>> {
        self.pipeline.options(name)
    }

    #[must_use]
    pub fn stats(&self) -> FactoryStatsSnapshot {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    #[must_use]
    pub fn pipeline(&self) -> &ClientOptionsPipeline {
        &self.pipeline
    }

    /// Number of names with a cached pipeline slot.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self.active.get(name) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.active.entry(name.to_owned()).or_default().value())
    }
}

impl<T> fmt::Debug for ClientFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("pipeline", &self.pipeline)
            .field("active", &self.active.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use http::{Request, StatusCode};

    use super::*;
    use crate::config::{ClientOptionsResolver, KeyedLazyConfigurator};
    use crate::context::ServiceContext;
    use crate::handler::{FnHandler, HandlerRegistration, HandlerRegistry};
    use crate::message::status_response;
    use crate::transport::FnTransport;

    struct Counters {
        configured: Arc<AtomicUsize>,
        handlers: Arc<AtomicUsize>,
    }

    fn factory(config: FactoryConfig) -> (ClientFactory<FnTransport>, Counters) {
        let configured = Arc::new(AtomicUsize::new(0));
        let handlers = Arc::new(AtomicUsize::new(0));

        let mut configurator = KeyedLazyConfigurator::<ClientOptions>::new();
        let count = Arc::clone(&configured);
        configurator.register_for("foo", move |_, options| {
            count.fetch_add(1, Ordering::SeqCst);
            options.base_address = Some("http://foo.localhost/".to_owned());
            options.add_handler("echo-path");
        });
        configurator.register_for("fast", |_, options| {
            options.handler_lifetime = Some(Duration::from_millis(100));
        });
        configurator.register_for("broken", |_, options| {
            options.add_handler("missing");
        });

        let mut ctx = ServiceContext::new();
        let mut registry = HandlerRegistry::new();
        let count = Arc::clone(&handlers);
        registry
            .register(
                "echo-path",
                HandlerRegistration::new().factory(move |_, _| {
                    count.fetch_add(1, Ordering::SeqCst);
                    FnHandler::new(|request: crate::message::HttpRequest| async move {
                        let mut response = status_response(StatusCode::OK);
                        *response.body_mut() = Bytes::from(request.uri().to_string());
                        Ok(response)
                    })
                }),
                &mut ctx,
            )
            .expect("registers");
        registry.seal();

        let pipeline = ClientOptionsPipeline::new(
            Arc::new(ClientOptionsResolver::new(configurator, None)),
            Arc::new(registry),
            Arc::new(ctx),
        );
        let transport = FnTransport::new(|_| async { Ok(status_response(StatusCode::NO_CONTENT)) });
        let factory = ClientFactory::new(pipeline, config, move |_| transport.clone())
            .expect("valid config");
        (factory, Counters { configured, handlers })
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_is_reused_within_lifetime() {
        let (factory, counters) = factory(FactoryConfig::short_lived());

        let first = factory.client("foo").expect("client");
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = factory.client("foo").expect("client");

        assert!(Arc::ptr_eq(first.pipeline(), second.pipeline()));
        assert_eq!(counters.handlers.load(Ordering::SeqCst), 1);
        assert_eq!(factory.stats().pipelines_built, 1);
        assert_eq!(factory.stats().clients_created, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rebuild_after_lifetime_does_not_rerun_configuration() {
        let (factory, counters) = factory(FactoryConfig::short_lived());

        let first = factory.client("foo").expect("client");
        tokio::time::advance(Duration::from_secs(3)).await;
        let second = factory.client("foo").expect("client");

        assert!(!Arc::ptr_eq(first.pipeline(), second.pipeline()));
        assert!(Arc::ptr_eq(first.pipeline().options(), second.pipeline().options()));
        assert_eq!(counters.handlers.load(Ordering::SeqCst), 2);
        assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
        assert_eq!(factory.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn per_client_lifetime_overrides_default() {
        let (factory, _) = factory(FactoryConfig::default());

        let first = factory.client("fast").expect("client");
        tokio::time::advance(Duration::from_millis(150)).await;
        let second = factory.client("fast").expect("client");

        assert!(!Arc::ptr_eq(first.pipeline(), second.pipeline()));
    }

    #[tokio::test]
    async fn expire_forces_rebuild() {
        let (factory, counters) = factory(FactoryConfig::default());

        factory.client("foo").expect("client");
        assert!(factory.expire("foo"));
        assert!(!factory.expire("foo"));
        assert!(!factory.expire("never-built"));
        factory.client("foo").expect("client");

        assert_eq!(counters.handlers.load(Ordering::SeqCst), 2);
        assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_build_does_not_affect_other_clients() {
        let (factory, _) = factory(FactoryConfig::default());

        let err = factory.client("broken").expect_err("missing handler");
        assert!(err.is_handler_not_found());
        assert!(factory.client("foo").is_ok());
        let err = factory.client("broken").expect_err("still missing");
        assert!(err.is_handler_not_found());
        assert_eq!(factory.stats().build_failures, 2);
    }

    #[tokio::test]
    async fn failed_names_leave_no_cached_slot() {
        let (factory, _) = factory(FactoryConfig::default());

        for i in 0..50 {
            let err = factory.client(&format!("unknown-{i}")).expect_err("unconfigured");
            assert!(err.is_unconfigured_client());
        }
        factory.client("broken").expect_err("missing handler");
        assert_eq!(factory.active_len(), 0);

        factory.client("foo").expect("client");
        assert_eq!(factory.active_len(), 1);
    }

    #[test]
    fn concurrent_first_requests_build_once() {
        let (factory, counters) = factory(FactoryConfig::default());
        let factory = Arc::new(factory);
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let pipelines: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    factory.client("foo").map(|client| Arc::clone(client.pipeline()))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().expect("client thread panicked").expect("client"))
            .collect();

        assert!(pipelines.iter().all(|p| Arc::ptr_eq(p, &pipelines[0])));
        assert_eq!(counters.handlers.load(Ordering::SeqCst), 1);
        assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
        assert_eq!(factory.stats().pipelines_built, 1);
    }

    #[tokio::test]
    async fn relative_uri_resolves_against_base_address() {
        let (factory, _) = factory(FactoryConfig::default());
        let client = factory.client("foo").expect("client");

        let response = client.get("status?code=1").await.expect("response");
        assert_eq!(response.body(), "http://foo.localhost/status?code=1");

        let request = Request::get("/items").body(Bytes::new()).expect("request");
        let response = client.send(request).await.expect("response");
        assert_eq!(response.body(), "http://foo.localhost/items");
    }

    #[tokio::test]
    async fn relative_uri_without_base_address_is_rejected() {
        let (factory, _) = factory(FactoryConfig::default());
        let client = factory.client("fast").expect("client");

        let err = client.get("/items").await.expect_err("no base address");
        assert!(err.is_request());
        assert_eq!(client.get("http://other.localhost/").await.expect("absolute").status(), StatusCode::NO_CONTENT);
        let stats = factory.stats();
        assert_eq!(stats.requests_total, 2);
        assert_eq!(stats.requests_failed, 1);
    }

    #[test]
    fn zero_lifetime_config_is_rejected() {
        let pipeline = ClientOptionsPipeline::new(
            Arc::new(ClientOptionsResolver::new(KeyedLazyConfigurator::new(), None)),
            Arc::new(HandlerRegistry::new()),
            Arc::new(ServiceContext::new()),
        );
        let transport = FnTransport::new(|_| async { Ok(status_response(StatusCode::OK)) });
        let result = ClientFactory::new(
            pipeline,
            FactoryConfig::new().with_handler_lifetime(Duration::ZERO),
            move |_| transport.clone(),
        );
        assert!(result.expect_err("zero lifetime").is_configuration());
    }
}
