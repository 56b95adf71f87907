//! Remote containers and the registry they are installed into
//!
//! A remote entry is a JSON document describing one independently built
//! bundle: its name, the packages it shares, and the modules it exposes.
//!
//! ```json
//! {
//!   "name": "@ext/a",
//!   "shared": [{"name": "@lumino/widgets", "version": "2.3.0", "singleton": true}],
//!   "modules": {
//!     "./extension": {"kind": "plugins", "exports": [{"id": "@ext/a:x"}]},
//!     "./style": {"kind": "style", "href": "style/index.css"}
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};
use url::Url;

use crate::plugins::ModuleExports;
use crate::{Error, Result};

use super::shared::{SharedPackage, SharedProvider, SharedScope, bind_packages};

/// Parsed remote entry document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Name the container installs itself under
    pub name: String,
    /// Packages this bundle shares
    #[serde(default)]
    pub shared: Vec<SharedPackage>,
    /// Exposed modules keyed by module id
    #[serde(default)]
    pub modules: HashMap<String, ModuleSpec>,
}

/// How an exposed module is produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModuleSpec {
    /// A plugin-providing module; `exports` is normalized on creation
    Plugins {
        /// Raw export value
        exports: serde_json::Value,
    },
    /// A style-only module
    Style {
        /// Stylesheet location, relative to the entry URL
        href: String,
    },
}

/// A stylesheet contributed by an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    /// Resolved stylesheet URL
    pub url: Url,
}

/// A created module value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Module {
    /// Plugin collection
    Plugins(ModuleExports),
    /// Stylesheet reference
    Style(StyleSheet),
}

/// Produces one module of a container
#[derive(Debug, Clone)]
pub struct ModuleFactory {
    container: String,
    module: String,
    spec: ModuleSpec,
    base: Url,
}

impl ModuleFactory {
    /// Create the module value
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleCreate`] if the exports are not a plugin
    /// collection or the stylesheet location cannot be resolved
    pub fn create(&self) -> Result<Module> {
        let module = match &self.spec {
            ModuleSpec::Plugins { exports } => ModuleExports::from_value(exports.clone())
                .map(Module::Plugins)
                .map_err(|e| self.create_error(&e))?,
            ModuleSpec::Style { href } => self
                .base
                .join(href)
                .map(|url| Module::Style(StyleSheet { url }))
                .map_err(|e| self.create_error(&e))?,
        };
        Ok(module)
    }

    fn create_error(&self, cause: &dyn std::fmt::Display) -> Error {
        Error::ModuleCreate {
            container: self.container.clone(),
            module: self.module.clone(),
            reason: cause.to_string(),
        }
    }
}

/// A loaded bundle exposing modules by id
#[derive(Debug)]
pub struct RemoteContainer {
    entry: RemoteEntry,
    url: Url,
    bindings: OnceCell<HashMap<String, SharedProvider>>,
}

impl RemoteContainer {
    /// Wrap an entry fetched from `url`
    #[must_use]
    pub fn new(entry: RemoteEntry, url: Url) -> Self {
        Self {
            entry,
            url,
            bindings: OnceCell::new(),
        }
    }

    /// Declared container name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// URL the entry was loaded from
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the container has joined a shared scope
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.bindings.initialized()
    }

    /// Providers this container's shared packages were bound to
    #[must_use]
    pub fn shared_bindings(&self) -> Option<&HashMap<String, SharedProvider>> {
        self.bindings.get()
    }

    /// Join `scope`, contributing and binding shared packages
    ///
    /// Returns false if the container was already initialized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SharedScope`] on a strict singleton conflict; the
    /// container stays uninitialized
    pub async fn init(&self, scope: &SharedScope) -> Result<bool> {
        let mut ran = false;
        self.bindings
            .get_or_try_init(|| {
                ran = true;
                bind_packages(scope, &self.entry.name, &self.entry.shared)
            })
            .await?;
        Ok(ran)
    }

    /// Look up the factory for `module`
    ///
    /// # Errors
    ///
    /// Returns error if the container is uninitialized or lacks the module
    pub fn get(&self, module: &str) -> Result<ModuleFactory> {
        if !self.is_initialized() {
            return Err(Error::ContainerNotInitialized(self.entry.name.clone()));
        }

        let spec = self
            .entry
            .modules
            .get(module)
            .ok_or_else(|| Error::ModuleNotFound {
                container: self.entry.name.clone(),
                module: module.to_string(),
            })?;

        Ok(ModuleFactory {
            container: self.entry.name.clone(),
            module: module.to_string(),
            spec: spec.clone(),
            base: self.url.clone(),
        })
    }

    /// Exposed module ids, sorted
    #[must_use]
    pub fn modules(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entry.modules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Name-keyed registry of loaded containers
///
/// Entries are only ever added.
#[derive(Debug, Default)]
pub struct RemoteRegistry {
    containers: RwLock<HashMap<String, Arc<RemoteContainer>>>,
}

impl RemoteRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a container under its declared name
    ///
    /// An already installed container with the same name is kept and returned.
    pub async fn install(&self, container: RemoteContainer) -> Arc<RemoteContainer> {
        let mut containers = self.containers.write().await;
        containers
            .entry(container.name().to_string())
            .or_insert_with(|| Arc::new(container))
            .clone()
    }

    /// Remove `container` if it is the one installed under its name
    ///
    /// Returns true if it was removed
    pub async fn remove_if_same(&self, container: &Arc<RemoteContainer>) -> bool {
        let mut containers = self.containers.write().await;
        let same = containers
            .get(container.name())
            .is_some_and(|installed| Arc::ptr_eq(installed, container));
        if same {
            containers.remove(container.name());
        }
        same
    }

    /// Get a container by name
    pub async fn get(&self, name: &str) -> Option<Arc<RemoteContainer>> {
        self.containers.read().await.get(name).cloned()
    }

    /// Whether a container is installed under `name`
    pub async fn contains(&self, name: &str) -> bool {
        self.containers.read().await.contains_key(name)
    }

    /// Installed container names, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.read().await.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of installed containers
    pub async fn len(&self) -> usize {
        self.containers.read().await.len()
    }

    /// Whether no container is installed
    pub async fn is_empty(&self) -> bool {
        self.containers.read().await.is_empty()
    }
}
