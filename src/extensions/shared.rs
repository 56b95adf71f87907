//! Shared-dependency scope negotiation
//!
//! Every remote container joins one process-wide [`SharedScope`]. The host's
//! own packages are registered first, exactly once; each container then
//! contributes the packages it bundles and binds each of its shared packages
//! to the first registered provider, so independently built bundles reuse
//! one instance instead of carrying duplicates.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};

use crate::{Error, Result};

use super::container::RemoteContainer;

/// Name of the host in provider records
pub const HOST_SCOPE: &str = "host";

/// A package offered to, or consumed from, the shared scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPackage {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Only one instance may exist in the process
    #[serde(default)]
    pub singleton: bool,
    /// With `singleton`, refuse a provider of any other version
    #[serde(default, rename = "strictVersion")]
    pub strict_version: bool,
}

impl SharedPackage {
    /// Create a non-singleton package
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            singleton: false,
            strict_version: false,
        }
    }
}

/// A registered provider of a shared package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedProvider {
    /// Provided version
    pub version: String,
    /// Container (or [`HOST_SCOPE`]) that registered it
    pub from: String,
}

/// Process-wide shared-dependency namespace
#[derive(Debug, Default)]
pub struct SharedScope {
    packages: RwLock<HashMap<String, Vec<SharedProvider>>>,
}

impl SharedScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider unless the same version is already provided
    ///
    /// Returns true if the provider was added
    pub async fn register(&self, package: &SharedPackage, from: &str) -> bool {
        let mut packages = self.packages.write().await;
        offer(packages.entry(package.name.clone()).or_default(), package, from)
    }

    /// Provider a consumer of `name` binds to
    pub async fn resolve(&self, name: &str) -> Option<SharedProvider> {
        self.packages
            .read()
            .await
            .get(name)
            .and_then(|providers| providers.first().cloned())
    }

    /// All providers registered for `name`, in registration order
    pub async fn providers(&self, name: &str) -> Vec<SharedProvider> {
        self.packages
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct shared package names
    pub async fn len(&self) -> usize {
        self.packages.read().await.len()
    }

    /// Whether nothing has been shared yet
    pub async fn is_empty(&self) -> bool {
        self.packages.read().await.is_empty()
    }
}

/// Establishes the shared scope and initializes containers against it
#[derive(Debug)]
pub struct ShareScopeInitializer {
    scope: Arc<SharedScope>,
    host_packages: Vec<SharedPackage>,
    host_ready: OnceCell<()>,
    negotiations: AtomicUsize,
}

impl ShareScopeInitializer {
    /// Create an initializer that offers `host_packages` to every container
    #[must_use]
    pub fn new(scope: Arc<SharedScope>, host_packages: Vec<SharedPackage>) -> Self {
        Self {
            scope,
            host_packages,
            host_ready: OnceCell::new(),
            negotiations: AtomicUsize::new(0),
        }
    }

    /// The scope containers are initialized against
    #[must_use]
    pub const fn scope(&self) -> &Arc<SharedScope> {
        &self.scope
    }

    /// Register the host's packages; runs once per initializer
    async fn init_sharing(&self) {
        self.host_ready
            .get_or_init(|| async {
                for package in &self.host_packages {
                    self.scope.register(package, HOST_SCOPE).await;
                }
                tracing::debug!(
                    packages = self.host_packages.len(),
                    "initialized shared scope"
                );
            })
            .await;
    }

    /// Bring a container into the shared scope
    ///
    /// Containers that already joined are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SharedScope`] if the container requires a strict
    /// singleton whose bound provider has a different version
    pub async fn negotiate(&self, container: &RemoteContainer) -> Result<()> {
        self.init_sharing().await;

        let newly_initialized = container.init(&self.scope).await?;
        if newly_initialized {
            self.negotiations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(container = %container.name(), "container joined shared scope");
        } else {
            tracing::debug!(
                container = %container.name(),
                "container already initialized, skipping negotiation"
            );
        }

        Ok(())
    }

    /// Number of containers initialized so far
    #[must_use]
    pub fn negotiations(&self) -> usize {
        self.negotiations.load(Ordering::Relaxed)
    }
}

fn offer(providers: &mut Vec<SharedProvider>, package: &SharedPackage, from: &str) -> bool {
    if providers.iter().any(|p| p.version == package.version) {
        return false;
    }

    providers.push(SharedProvider {
        version: package.version.clone(),
        from: from.to_string(),
    });
    true
}

/// Bind each of `packages` to a provider in `scope`, contributing them first
///
/// Conflicts are checked before anything is contributed, so a container
/// that fails to bind leaves the scope as it was.
///
/// # Errors
///
/// Returns [`Error::SharedScope`] on a strict singleton version conflict
pub(crate) async fn bind_packages(
    scope: &SharedScope,
    container: &str,
    packages: &[SharedPackage],
) -> Result<HashMap<String, SharedProvider>> {
    let mut table = scope.packages.write().await;

    for package in packages.iter().filter(|p| p.singleton && p.strict_version) {
        let Some(provider) = table.get(&package.name).and_then(|p| p.first()) else {
            continue;
        };
        if provider.version != package.version {
            return Err(Error::SharedScope {
                container: container.to_string(),
                reason: format!(
                    "singleton '{}' requires version {}, but {} provides {}",
                    package.name, package.version, provider.from, provider.version
                ),
            });
        }
    }

    for package in packages {
        let providers = table.entry(package.name.clone()).or_default();
        // Singletons never add a second instance
        if package.singleton && !providers.is_empty() {
            continue;
        }
        offer(providers, package, container);
    }

    let mut bindings = HashMap::with_capacity(packages.len());
    for package in packages {
        let Some(provider) = table.get(&package.name).and_then(|p| p.first()).cloned() else {
            continue;
        };

        if package.singleton && provider.version != package.version {
            tracing::warn!(
                container,
                package = %package.name,
                wanted = %package.version,
                bound = %provider.version,
                "shared singleton version mismatch"
            );
        }

        bindings.insert(package.name.clone(), provider);
    }

    Ok(bindings)
}
