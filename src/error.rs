//! Error types for the federated bootstrap

use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling the plugin set
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The federated extension list could not be parsed
    ///
    /// This is the only fatal bootstrap error.
    #[error("malformed federated extension manifest: {0}")]
    ManifestParse(#[source] serde_json::Error),

    /// A remote entry could not be fetched or installed
    #[error("failed to load remote '{name}': {reason}")]
    RemoteLoad {
        /// Extension name
        name: String,
        /// Underlying cause
        reason: String,
    },

    /// Fetching a remote entry failed at the transport level
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Shared-dependency negotiation failed for a container
    #[error("shared scope error in '{container}': {reason}")]
    SharedScope {
        /// Container name
        container: String,
        /// Underlying cause
        reason: String,
    },

    /// No container is installed under the given name
    #[error("no remote container named '{0}'")]
    ContainerNotFound(String),

    /// A module was requested before the container joined the shared scope
    #[error("remote container '{0}' has not been initialized")]
    ContainerNotInitialized(String),

    /// The container does not expose the requested module
    #[error("module '{module}' not found in remote '{container}'")]
    ModuleNotFound {
        /// Container name
        container: String,
        /// Module id
        module: String,
    },

    /// The module factory failed
    #[error("failed to create module '{module}' of '{container}': {reason}")]
    ModuleCreate {
        /// Container name
        container: String,
        /// Module id
        module: String,
        /// Underlying cause
        reason: String,
    },

    /// A module exported something that is not a plugin collection
    #[error("invalid plugin exports: {0}")]
    Exports(String),

    /// Application lifecycle error
    #[error("application error: {0}")]
    App(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing error
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}
