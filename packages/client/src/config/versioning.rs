//! Version-suffix naming convention
//!
//! Clients named `<base>-<tag>` that were never registered explicitly get
//! their options from a fallback constructor, built once per exact name.
//! `foo-v2` and `foo-v3` are independent entries.

use std::fmt;
use std::sync::Arc;

use super::lazy::EntryMap;
use crate::context::ServiceContext;
use crate::error::{self, BoxError, Result};

/// A client name split according to the version-suffix convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedName<'a> {
    full: &'a str,
    base: &'a str,
    tag: &'a str,
}

impl<'a> VersionedName<'a> {
    /// Split `name` on its final `-`.
    ///
    /// Returns `None` when there is no `-`, or when the base or the tag is
    /// empty or whitespace.
    #[must_use]
    pub fn parse(name: &'a str) -> Option<Self> {
        let (base, tag) = name.rsplit_once('-')?;
        if base.trim().is_empty() || tag.trim().is_empty() {
            return None;
        }
        Some(Self {
            full: name,
            base,
            tag,
        })
    }

    /// The complete client name, tag included
    #[must_use]
    pub fn full(&self) -> &'a str {
        self.full
    }

    #[must_use]
    pub fn base(&self) -> &'a str {
        self.base
    }

    #[must_use]
    pub fn tag(&self) -> &'a str {
        self.tag
    }
}

impl fmt::Display for VersionedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full)
    }
}

type ConstructFn<T> =
    dyn Fn(&ServiceContext, &VersionedName<'_>) -> std::result::Result<T, BoxError> + Send + Sync;

/// Derives options for unregistered names that follow the version convention.
pub struct VersionedNameResolver<T> {
    construct: Box<ConstructFn<T>>,
    cache: EntryMap<T>,
}

impl<T> VersionedNameResolver<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F>(construct: F) -> Self
    where
        F: Fn(&ServiceContext, &VersionedName<'_>) -> std::result::Result<T, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            construct: Box::new(construct),
            cache: EntryMap::new(),
        }
    }

    /// Resolve `name` through the convention.
    ///
    /// Returns `None` when the name does not follow the convention. The
    /// constructor runs at most once per exact name; a failed construction
    /// is retried on the next request.
    pub fn resolve(&self, ctx: &ServiceContext, name: &str) -> Option<Result<Arc<T>>> {
        let versioned = VersionedName::parse(name)?;

        Some(self.cache.get_or_try_init(name, || {
            tracing::debug!(
                target: "httpreg::config",
                client = %name,
                base = %versioned.base(),
                tag = %versioned.tag(),
                "Constructing options for versioned client name"
            );
            (self.construct)(ctx, &versioned).map_err(|e| error::callback(name, e))
        }))
    }

    /// Number of distinct versioned names constructed or attempted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<T> fmt::Debug for VersionedNameResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedNameResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
