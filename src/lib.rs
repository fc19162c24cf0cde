//! Normalizes the output of many User-Agent parsing backends into one
//! [`ParsedResult`] shape, so their answers can be compared side by side.
//!
//! Backends are registered in a [`ModuleRegistry`] as untyped export
//! tables; each adapter in [`adapters`] locates its backend's entry points,
//! calls them, and maps whatever comes back. [`builtin`] provides two
//! backends out of the box, including a Matomo-format regex detector
//! ([`RegexDetector`]).

pub mod adapters;
mod aggregate;
pub mod aliases;
pub mod backend;
pub mod batch;
pub mod builtin;
mod config;
mod engine;
mod error;
pub mod helpers;
pub mod server;
mod types;

pub use adapters::{Adapter, BackendKind};
pub use aggregate::Aggregator;
pub use backend::{BackendModule, Export, ModuleRegistry};
pub use config::{BatchConfig, Config, ServerConfig};
pub use engine::RegexDetector;
pub use error::{Error, Result};
pub use helpers::{classify_device, split_version};
pub use types::*;
