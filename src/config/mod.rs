//! Host configuration for the bootstrap
//!
//! Values are resolved with precedence CLI overrides > environment
//! (`FEDBOOT_*`) > TOML file > defaults.

pub mod file;

use std::path::{Path, PathBuf};

use url::Url;

use crate::extensions::SharedPackage;
use crate::{Error, Result};

use file::BootstrapConfigFile;

/// Default application server URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888/";

/// Path (relative to the base URL) federated extensions are served from
pub const DEFAULT_LABEXTENSIONS_PATH: &str = "lab/extensions/";

/// Path (relative to the base URL) the application's own assets live under
pub const PUBLIC_PATH: &str = "example/";

/// Bootstrap configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application server base URL
    pub base_url: Url,

    /// Base URL federated extension entries are resolved against
    pub labextensions_url: Url,

    /// Raw federated extension list (JSON), parsed by the bootstrap
    pub federated_extensions: String,

    /// Administratively disabled plugins and extensions
    pub disabled: DisabledExtensions,

    /// Packages the host offers to the shared scope
    pub shared: Vec<SharedPackage>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file; errors loading it are fatal
    pub config_path: Option<PathBuf>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Labextensions URL override
    pub labextensions_url: Option<String>,
    /// Federated extension list file override
    pub extensions_file: Option<PathBuf>,
    /// Additional disabled ids
    pub disabled: Vec<String>,
}

impl Config {
    /// Load configuration from the file, the process environment, and overrides
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded, a URL is
    /// invalid, or the extension list file cannot be read
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let fc = match &overrides.config_path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration from explicit sources
    ///
    /// # Errors
    ///
    /// Returns error if a URL is invalid or the extension list file cannot be read
    pub fn from_sources(
        fc: BootstrapConfigFile,
        env: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env("FEDBOOT_BASE_URL"))
            .or(fc.server.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_dir_url(&base_url)?;

        let labextensions_url = match overrides
            .labextensions_url
            .clone()
            .or_else(|| env("FEDBOOT_LABEXTENSIONS_URL"))
            .or(fc.server.labextensions_url)
        {
            Some(url) => parse_dir_url(&url)?,
            None => base_url.join(DEFAULT_LABEXTENSIONS_PATH)?,
        };

        // A file beats an inline list at the same precedence level
        let extensions_file = overrides
            .extensions_file
            .clone()
            .or_else(|| env("FEDBOOT_EXTENSIONS_FILE").map(PathBuf::from));

        let federated_extensions = if let Some(path) = extensions_file {
            read_extensions_file(&path)?
        } else if let Some(raw) = env("FEDBOOT_FEDERATED_EXTENSIONS") {
            raw
        } else if let Some(path) = fc.federation.extensions_file {
            read_extensions_file(Path::new(&path))?
        } else {
            fc.federation.extensions.unwrap_or_else(|| "[]".to_string())
        };

        let mut disabled = fc.federation.disabled;
        if let Some(raw) = env("FEDBOOT_DISABLED") {
            disabled.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string),
            );
        }
        disabled.extend(overrides.disabled.iter().cloned());

        Ok(Self {
            base_url,
            labextensions_url,
            federated_extensions,
            disabled: DisabledExtensions::new(disabled),
            shared: fc.federation.shared,
        })
    }

    /// URL the application's own assets are served from
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be joined
    pub fn public_path(&self) -> Result<Url> {
        Ok(self.base_url.join(PUBLIC_PATH)?)
    }
}

/// Parse a URL used as a directory, ensuring a trailing slash
fn parse_dir_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn read_extensions_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read extension list {}: {e}",
            path.display()
        ))
    })
}

/// Administratively disabled plugin ids and extension names
///
/// An entry matches a plugin id exactly, or matches every plugin of a
/// package when it equals the part of the id before `:`.
#[derive(Debug, Clone, Default)]
pub struct DisabledExtensions {
    entries: Vec<String>,
}

impl DisabledExtensions {
    /// Create from a list of ids or package names
    #[must_use]
    pub const fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Whether the plugin or extension is disabled
    #[must_use]
    pub fn is_disabled(&self, id: &str) -> bool {
        let package = id.split_once(':').map(|(package, _)| package);

        self.entries
            .iter()
            .any(|entry| entry == id || package.is_some_and(|p| p == entry))
    }

    /// Configured entries
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
