//! TOML configuration file loading
//!
//! Supports `~/.config/fedboot/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::extensions::SharedPackage;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BootstrapConfigFile {
    /// Server URLs
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Federated extension settings
    #[serde(default)]
    pub federation: FederationFileConfig,
}

/// Server URL configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Base URL of the application server
    pub base_url: Option<String>,

    /// Base URL federated extensions are served under
    pub labextensions_url: Option<String>,
}

/// Federated extension configuration
#[derive(Debug, Default, Deserialize)]
pub struct FederationFileConfig {
    /// Inline federated extension list (JSON)
    pub extensions: Option<String>,

    /// Path to a JSON file holding the federated extension list
    pub extensions_file: Option<String>,

    /// Disabled plugin ids or package names
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Packages the host offers to the shared scope
    #[serde(default)]
    pub shared: Vec<SharedPackage>,
}

/// Load and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn load_config_file_from(path: &Path) -> Result<BootstrapConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `BootstrapConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> BootstrapConfigFile {
    let Some(path) = config_file_path() else {
        return BootstrapConfigFile::default();
    };

    if !path.exists() {
        return BootstrapConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            BootstrapConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/fedboot/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("fedboot").join("config.toml"))
}
