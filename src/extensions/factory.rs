//! Module instantiation from loaded containers

use crate::{Error, Result};

use super::container::{Module, RemoteRegistry};

/// Create module `module` of the container installed as `name`
///
/// Failures are logged with the extension and module, then returned.
///
/// # Errors
///
/// Returns error if no container is installed under `name`, the container
/// is uninitialized or lacks `module`, or the module factory fails
pub async fn instantiate(registry: &RemoteRegistry, name: &str, module: &str) -> Result<Module> {
    let result = match registry.get(name).await {
        Some(container) => container.get(module).and_then(|factory| factory.create()),
        None => Err(Error::ContainerNotFound(name.to_string())),
    };

    if let Err(e) = &result {
        tracing::warn!(
            extension = %name,
            module = %module,
            error = %e,
            "failed to create module"
        );
    }

    result
}
