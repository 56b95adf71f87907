//! Federated extension loading
//!
//! Extensions are independently built bundles hosted at their own URLs. The
//! host advertises them in a JSON list ([`manifest`]); each advertised entry
//! is fetched and installed as a [`RemoteContainer`] ([`loader`]), joined to
//! the process-wide [`SharedScope`] ([`shared`]), and asked for its modules
//! ([`factory`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use federated_bootstrap::extensions::{factory, manifest, RemoteLoader};
//!
//! for descriptor in manifest::parse(&raw)? {
//!     let url = descriptor.entry_url(&labextensions_url)?;
//!     loader.load(&descriptor.name, &url).await?;
//!     if let Some(module) = &descriptor.extension_module {
//!         let module = factory::instantiate(loader.registry(), &descriptor.name, module).await?;
//!     }
//! }
//! ```

pub mod container;
pub mod factory;
pub mod loader;
pub mod manifest;
pub mod shared;

pub use container::{
    Module, ModuleFactory, ModuleSpec, RemoteContainer, RemoteEntry, RemoteRegistry, StyleSheet,
};
pub use factory::instantiate;
pub use loader::{EntryFetcher, HttpFetcher, RemoteLoader};
pub use manifest::{ExtensionDescriptor, parse, resolve_entry};
pub use shared::{SharedPackage, SharedProvider, SharedScope, ShareScopeInitializer};
