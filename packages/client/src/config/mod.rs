//! Configuration: lazy per-name options, the version convention and factory settings
//!
//! Options of any type are configured on first request for a name and then
//! stay fixed for the life of the process. Only derived artifacts (the built
//! handler chain) are ever rebuilt.

pub mod client_options;
pub mod factory;
pub mod json;
pub mod lazy;
pub mod resolver;
pub mod validation;
pub mod versioning;

pub use client_options::ClientOptions;
pub use factory::FactoryConfig;
pub use lazy::{ConfigurationEntry, EntryMap, KeyedLazyConfigurator, NamedOptions};
pub use resolver::{ClientOptionsResolver, OptionsSource};
pub use validation::{ConfigDefaults, ConfigValidator, ConfigurationError};
pub use versioning::{VersionedName, VersionedNameResolver};
