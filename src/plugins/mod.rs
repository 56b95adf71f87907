//! Plugin records and filtering
//!
//! Plugins are either built into the application ([`builtin`]) or exported
//! by federated extension modules in one of several shapes, normalized by
//! [`ModuleExports`]. Disabled plugins are dropped by [`active_plugins`].

pub mod builtin;
pub mod filter;
pub mod record;

pub use filter::{DisabledSet, active_plugins};
pub use record::{ModuleExports, PluginExports, PluginRecord, PluginSource};
