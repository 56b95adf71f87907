//! Bootstrap orchestration
//!
//! Assembles the application's plugin set from the built-in modules and the
//! advertised federated extensions, then starts the application.
//!
//! Each phase fans out over every candidate and waits for all of them to
//! settle before the next phase begins. A failed remote, module, or
//! stylesheet only loses its own contribution; the one fatal error is an
//! unparsable extension list.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use url::Url;

use crate::app::Application;
use crate::config::Config;
use crate::extensions::{
    EntryFetcher, ExtensionDescriptor, Module, RemoteLoader, RemoteRegistry, ShareScopeInitializer,
    SharedScope, StyleSheet, factory, manifest,
};
use crate::plugins::{DisabledSet, ModuleExports, PluginRecord, PluginSource, active_plugins};
use crate::{Error, Result};

/// Bootstrap phase a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching and initializing a remote entry
    Load,
    /// Creating an extension module
    Extension,
    /// Creating a style module
    Style,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Extension => "extension",
            Self::Style => "style",
        })
    }
}

/// A unit of work that failed and was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Extension name
    pub extension: String,
    /// Module id, for module failures
    pub module: Option<String>,
    /// Phase
    pub stage: Stage,
    /// Error message
    pub reason: String,
}

/// A stylesheet contributed by a federated extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedStyle {
    /// Extension name
    pub extension: String,
    /// Stylesheet URL
    pub url: Url,
}

/// Everything the bootstrap produced
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    /// Plugins handed to the application, in registration order
    pub plugins: Vec<PluginRecord>,
    /// Plugins skipped because they are disabled
    pub disabled: DisabledSet,
    /// Extensions whose remote entry loaded
    pub loaded: Vec<String>,
    /// Stylesheets that loaded
    pub styles: Vec<LoadedStyle>,
    /// Skipped units of work
    pub failures: Vec<LoadFailure>,
}

impl BootstrapReport {
    /// Ids of the assembled plugins
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.id.as_str()).collect()
    }

    /// Failures of one stage
    #[must_use]
    pub fn failures_in(&self, stage: Stage) -> Vec<&LoadFailure> {
        self.failures.iter().filter(|f| f.stage == stage).collect()
    }

    fn fail(&mut self, extension: &str, module: Option<&str>, stage: Stage, error: &Error) {
        tracing::error!(
            extension,
            module = module.unwrap_or_default(),
            %stage,
            error = %error,
            "federated extension failure"
        );
        self.failures.push(LoadFailure {
            extension: extension.to_string(),
            module: module.map(ToString::to_string),
            stage,
            reason: error.to_string(),
        });
    }
}

/// Drives federated extension loading
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: Arc<Config>,
    loader: RemoteLoader,
}

impl Bootstrap {
    /// Create a bootstrap with its own registry and shared scope
    #[must_use]
    pub fn new(config: Config, fetcher: Arc<dyn EntryFetcher>) -> Self {
        let sharing = Arc::new(ShareScopeInitializer::new(
            Arc::new(SharedScope::new()),
            config.shared.clone(),
        ));
        let loader = RemoteLoader::new(fetcher, Arc::new(RemoteRegistry::new()), sharing);
        Self::with_loader(config, loader)
    }

    /// Create a bootstrap around an existing loader
    #[must_use]
    pub fn with_loader(config: Config, loader: RemoteLoader) -> Self {
        Self {
            config: Arc::new(config),
            loader,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loader (and through it the registry and shared scope)
    #[must_use]
    pub const fn loader(&self) -> &RemoteLoader {
        &self.loader
    }

    /// Assemble the plugin set without starting anything
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestParse`] if the federated extension list is
    /// malformed; every other failure is recorded in the report
    pub async fn assemble(&self, builtin: Vec<ModuleExports>) -> Result<BootstrapReport> {
        let descriptors = manifest::parse(&self.config.federated_extensions)?;
        tracing::info!(count = descriptors.len(), "loading federated extensions");

        let mut report = BootstrapReport::default();
        let loaded = self.load_remotes(descriptors, &mut report).await;

        let extension_requests: Vec<(&str, &str)> = loaded
            .iter()
            .filter_map(|d| Some((d.name.as_str(), d.extension_module.as_deref()?)))
            .collect();

        for descriptor in &loaded {
            if let Some(mime) = &descriptor.mime_extension_module {
                tracing::debug!(
                    extension = %descriptor.name,
                    module = %mime,
                    "mime extension modules are not loaded"
                );
            }
        }

        let style_requests: Vec<(&str, &str)> = loaded
            .iter()
            .filter(|d| !self.config.disabled.is_disabled(&d.name))
            .filter_map(|d| Some((d.name.as_str(), d.style_module.as_deref()?)))
            .collect();

        let extensions = self.instantiate_all(&extension_requests).await;
        let styles = self.instantiate_all(&style_requests).await;

        report.plugins = builtin
            .into_iter()
            .flat_map(ModuleExports::into_plugins)
            .collect();

        for (&(name, module), outcome) in extension_requests.iter().zip(extensions) {
            match outcome {
                Ok(Module::Plugins(exports)) => {
                    let active: Vec<PluginRecord> =
                        active_plugins(exports, &self.config.disabled, &mut report.disabled)
                            .collect();
                    for mut plugin in active {
                        if report.disabled.contains(&plugin.id) {
                            continue;
                        }
                        plugin.source = PluginSource::Federated(name.to_string());
                        report.plugins.push(plugin);
                    }
                }
                Ok(Module::Style(_)) => {
                    let error = Error::Exports("extension module is a stylesheet".to_string());
                    report.fail(name, Some(module), Stage::Extension, &error);
                }
                Err(e) => report.fail(name, Some(module), Stage::Extension, &e),
            }
        }

        for (&(name, module), outcome) in style_requests.iter().zip(styles) {
            match outcome {
                Ok(Module::Style(StyleSheet { url })) => {
                    tracing::debug!(extension = %name, %url, "loaded stylesheet");
                    report.styles.push(LoadedStyle {
                        extension: name.to_string(),
                        url,
                    });
                }
                // Style modules are loaded for their side effects only
                Ok(Module::Plugins(_)) => {
                    tracing::debug!(extension = %name, module = %module, "loaded style module");
                }
                Err(e) => report.fail(name, Some(module), Stage::Style, &e),
            }
        }

        if !report.disabled.is_empty() {
            tracing::info!(disabled = ?report.disabled.ids(), "skipped disabled plugins");
        }

        Ok(report)
    }

    /// Assemble the plugin set, register it with `app`, and start `app`
    ///
    /// # Errors
    ///
    /// Returns error if the extension list is malformed or the application
    /// fails to start
    pub async fn run<A: Application>(
        &self,
        app: &mut A,
        builtin: Vec<ModuleExports>,
    ) -> Result<BootstrapReport> {
        let report = self.assemble(builtin).await?;

        tracing::info!(
            plugins = report.plugins.len(),
            styles = report.styles.len(),
            failures = report.failures.len(),
            "registering plugins"
        );
        app.register_plugins(report.plugins.clone());
        app.start().await?;

        Ok(report)
    }

    /// Load every descriptor's remote entry, keeping the ones that loaded
    async fn load_remotes(
        &self,
        descriptors: Vec<ExtensionDescriptor>,
        report: &mut BootstrapReport,
    ) -> Vec<ExtensionDescriptor> {
        let outcomes = join_all(descriptors.iter().map(|descriptor| async move {
            let url = descriptor.entry_url(&self.config.labextensions_url)?;
            self.loader.load(&descriptor.name, &url).await?;
            Ok::<_, Error>(())
        }))
        .await;

        let mut loaded = Vec::with_capacity(descriptors.len());
        for (descriptor, outcome) in descriptors.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    report.loaded.push(descriptor.name.clone());
                    loaded.push(descriptor);
                }
                Err(e) => report.fail(&descriptor.name, None, Stage::Load, &e),
            }
        }
        loaded
    }

    async fn instantiate_all(&self, requests: &[(&str, &str)]) -> Vec<Result<Module>> {
        let registry = self.loader.registry();
        join_all(
            requests
                .iter()
                .map(|(name, module)| factory::instantiate(registry, name, module)),
        )
        .await
    }
}
