//! Service context shared with configuration callbacks and handler factories
//!
//! Stands in for a dependency-injection container: components are inserted by
//! type while the registry is being assembled, then the context is frozen
//! behind an `Arc` and only read from.

use std::any::{Any, TypeId};
use std::fmt;

use hashbrown::HashMap;

/// Type-keyed map of shared services.
#[derive(Default)]
pub struct ServiceContext {
    services: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ServiceContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a service, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) -> Option<T> {
        self.services
            .insert(TypeId::of::<T>(), Box::new(service))
            .and_then(|prev| prev.downcast::<T>().ok().map(|boxed| *boxed))
    }

    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| service.downcast_ref::<T>())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.services
            .get_mut(&TypeId::of::<T>())
            .and_then(|service| service.downcast_mut::<T>())
    }

    /// Get the service of type `T`, inserting one built by `init` when absent.
    pub fn get_or_insert_with<T, F>(&mut self, init: F) -> &mut T
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let service = self
            .services
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()));
        match service.downcast_mut::<T>() {
            Some(service) => service,
            None => unreachable!("service map entries are keyed by their own TypeId"),
        }
    }

    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("services", &self.services.len())
            .finish()
    }
}
