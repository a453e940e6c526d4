//! Lazy, memoized, per-key configuration
//!
//! A [`KeyedLazyConfigurator`] runs its registered callbacks against a fresh
//! value the first time a key is resolved and hands the same `Arc` back to
//! every later (or racing) caller. Entries are never removed.
//!
//! Exclusion is per key: the map shard lock is only held long enough to find
//! or insert the entry, and the callbacks run inside that entry's `OnceCell`.
//! Callers resolving different keys never wait on each other.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::context::ServiceContext;
use crate::error::{self, BoxError, Result};

/// One configured (or still unconfigured) value for a key.
pub struct ConfigurationEntry<T> {
    name: String,
    value: OnceCell<Arc<T>>,
}

impl<T> ConfigurationEntry<T> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured value, `None` until configuration succeeded.
    #[must_use]
    pub fn value(&self) -> Option<&Arc<T>> {
        self.value.get()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T> fmt::Debug for ConfigurationEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationEntry")
            .field("name", &self.name)
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Concurrent map of once-initialized entries keyed by name.
pub struct EntryMap<T> {
    entries: DashMap<String, Arc<ConfigurationEntry<T>>>,
}

impl<T> Default for EntryMap<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> EntryMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `init` at most once at a time.
    ///
    /// A failing `init` leaves the key unconfigured; the error goes to the
    /// caller that ran it and the next caller (waiting or later) retries.
    /// The last failing caller drops the entry, so rejected keys are not kept.
    pub fn get_or_try_init<F>(&self, key: &str, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let entry = self.entry_for(key);

        if let Some(value) = entry.value() {
            return Ok(Arc::clone(value));
        }

        let result = entry
            .value
            .get_or_try_init(|| init().map(Arc::new))
            .map(Arc::clone);

        if result.is_err() {
            // Two references left means the map and this caller; nobody is waiting on it.
            self.entries.remove_if(key, |_, current| {
                Arc::ptr_eq(current, &entry)
                    && !current.is_configured()
                    && Arc::strong_count(current) == 2
            });
        }
        result
    }

    /// Inspect the entry for `key` without creating it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<ConfigurationEntry<T>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_for(&self, key: &str) -> Arc<ConfigurationEntry<T>> {
        // The read guard must be released before `entry()` locks the shard for writing.
        let existing = self.entries.get(key).map(|entry| Arc::clone(entry.value()));
        match existing {
            Some(entry) => entry,
            None => Arc::clone(
                self.entries
                    .entry(key.to_owned())
                    .or_insert_with(|| Arc::new(ConfigurationEntry::new(key)))
                    .value(),
            ),
        }
    }
}

impl<T> fmt::Debug for EntryMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}

type ConfigureFn<T> =
    dyn Fn(&ServiceContext, &str, &mut T) -> std::result::Result<(), BoxError> + Send + Sync;

struct Callback<T> {
    /// `None` applies to every key
    scope: Option<String>,
    run: Box<ConfigureFn<T>>,
}

impl<T> Callback<T> {
    fn applies_to(&self, key: &str) -> bool {
        self.scope.as_deref().is_none_or(|scope| scope == key)
    }
}

/// Runs registered configuration callbacks once per distinct key.
pub struct KeyedLazyConfigurator<T> {
    callbacks: Vec<Callback<T>>,
    entries: EntryMap<T>,
}

/// Per-name options store for any options type, looked up through the [`ServiceContext`].
pub type NamedOptions<T> = KeyedLazyConfigurator<T>;

impl<T> Default for KeyedLazyConfigurator<T> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
            entries: EntryMap::new(),
        }
    }
}

impl<T> KeyedLazyConfigurator<T>
where
    T: Default + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback applied to every key on its first resolution.
    ///
    /// Keys already resolved keep the value they were configured with.
    pub fn register<F>(&mut self, configure: F) -> &mut Self
    where
        F: Fn(&ServiceContext, &str, &mut T) + Send + Sync + 'static,
    {
        self.push(None, move |ctx, key, value| {
            configure(ctx, key, value);
            Ok(())
        })
    }

    /// Register a fallible callback applied to every key.
    pub fn try_register<F>(&mut self, configure: F) -> &mut Self
    where
        F: Fn(&ServiceContext, &str, &mut T) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.push(None, configure)
    }

    /// Register a callback applied only to `key`. Such keys count as explicitly configured.
    pub fn register_for<F>(&mut self, key: impl Into<String>, configure: F) -> &mut Self
    where
        F: Fn(&ServiceContext, &mut T) + Send + Sync + 'static,
    {
        self.push(Some(key.into()), move |ctx, _, value| {
            configure(ctx, value);
            Ok(())
        })
    }

    /// Register a fallible callback applied only to `key`.
    pub fn try_register_for<F>(&mut self, key: impl Into<String>, configure: F) -> &mut Self
    where
        F: Fn(&ServiceContext, &mut T) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.push(Some(key.into()), move |ctx, _, value| configure(ctx, value))
    }

    fn push<F>(&mut self, scope: Option<String>, run: F) -> &mut Self
    where
        F: Fn(&ServiceContext, &str, &mut T) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.callbacks.push(Callback {
            scope,
            run: Box::new(run),
        });
        self
    }

    /// Resolve the configured value for `key`, configuring it on first access.
    ///
    /// # Errors
    ///
    /// Returns a `Callback` error if any callback fails. The key stays
    /// unconfigured and the next resolution runs the callbacks again.
    pub fn resolve(&self, ctx: &ServiceContext, key: &str) -> Result<Arc<T>> {
        self.entries
            .get_or_try_init(key, || self.configure(ctx, key))
    }

    fn configure(&self, ctx: &ServiceContext, key: &str) -> Result<T> {
        let mut value = T::default();
        let mut applied = 0_usize;

        for callback in self.callbacks.iter().filter(|cb| cb.applies_to(key)) {
            (callback.run)(ctx, key, &mut value).map_err(|e| {
                tracing::warn!(
                    target: "httpreg::config",
                    client = %key,
                    error = %e,
                    "Configuration callback failed, entry left unconfigured"
                );
                error::callback(key, e)
            })?;
            applied += 1;
        }

        tracing::debug!(
            target: "httpreg::config",
            client = %key,
            callbacks = applied,
            options = std::any::type_name::<T>(),
            "Configured options on first request"
        );

        Ok(value)
    }

    /// True if at least one callback is bound to exactly this key.
    #[must_use]
    pub fn is_explicit(&self, key: &str) -> bool {
        self.callbacks
            .iter()
            .any(|cb| cb.scope.as_deref() == Some(key))
    }

    /// True if any callback applies to every key.
    #[must_use]
    pub fn has_global_callbacks(&self) -> bool {
        self.callbacks.iter().any(|cb| cb.scope.is_none())
    }

    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn entry(&self, key: &str) -> Option<Arc<ConfigurationEntry<T>>> {
        self.entries.get(key)
    }

    /// Number of distinct keys seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for KeyedLazyConfigurator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLazyConfigurator")
            .field("callbacks", &self.callbacks.len())
            .field("entries", &self.entries)
            .finish()
    }
}
