//! Registration-phase builder
//!
//! Collects handler registrations and per-name configuration callbacks,
//! then seals them into a client factory.

mod clients;
mod core;
mod handlers;
mod options;

pub use self::core::HttpRegistryBuilder;
