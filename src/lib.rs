//! Federated Bootstrap - plugin assembly for extensible application shells
//!
//! This library discovers, fetches, initializes and registers independently
//! built extension bundles alongside the application's built-in plugins:
//! - Federated extension list parsing and entry resolution
//! - Remote entry loading into an injected container registry
//! - Shared-dependency scope negotiation
//! - Module instantiation and disabled-plugin filtering
//! - Settle-all orchestration that never lets one extension block startup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Bootstrap                         │
//! │   manifest  →  load (all)  →  modules (all)  →  App │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Extensions                         │
//! │   Loader  │  Registry  │  Shared scope  │  Factory  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Plugins                           │
//! │   Built-in modules  │  Export normalization │ Filter │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extensions;
pub mod plugins;

pub use app::{App, Application};
pub use bootstrap::{Bootstrap, BootstrapReport, LoadFailure, LoadedStyle, Stage};
pub use config::{Config, ConfigOverrides, DisabledExtensions};
pub use error::{Error, Result};
pub use extensions::{
    EntryFetcher, ExtensionDescriptor, HttpFetcher, Module, RemoteContainer, RemoteLoader,
    RemoteRegistry, SharedPackage, SharedScope, ShareScopeInitializer,
};
pub use plugins::{DisabledSet, ModuleExports, PluginExports, PluginRecord, PluginSource};
