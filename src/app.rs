//! Application composition root
//!
//! The bootstrap only needs somewhere to hand the assembled plugins and a
//! way to start; [`Application`] is that seam. [`App`] is the minimal
//! implementation the CLI runs.

use std::collections::HashSet;

use async_trait::async_trait;
use url::Url;

use crate::plugins::PluginRecord;
use crate::{Error, Result};

/// Receives the assembled plugin set
#[async_trait]
pub trait Application: Send {
    /// Register plugins in order
    fn register_plugins(&mut self, plugins: Vec<PluginRecord>);

    /// Start the application
    ///
    /// # Errors
    ///
    /// Returns error if the application cannot start
    async fn start(&mut self) -> Result<()>;
}

/// Minimal application shell
#[derive(Debug)]
pub struct App {
    public_path: Url,
    plugins: Vec<PluginRecord>,
    ids: HashSet<String>,
    activated: Vec<String>,
    started: bool,
}

impl App {
    /// Create an application serving assets from `public_path`
    #[must_use]
    pub fn new(public_path: Url) -> Self {
        Self {
            public_path,
            plugins: Vec::new(),
            ids: HashSet::new(),
            activated: Vec::new(),
            started: false,
        }
    }

    /// Asset base URL
    #[must_use]
    pub const fn public_path(&self) -> &Url {
        &self.public_path
    }

    /// Registered plugins in registration order
    #[must_use]
    pub fn plugins(&self) -> &[PluginRecord] {
        &self.plugins
    }

    /// Ids of plugins activated on start
    #[must_use]
    pub fn activated(&self) -> &[String] {
        &self.activated
    }

    /// Whether `start` has completed
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }
}

#[async_trait]
impl Application for App {
    fn register_plugins(&mut self, plugins: Vec<PluginRecord>) {
        for plugin in plugins {
            if !self.ids.insert(plugin.id.clone()) {
                tracing::warn!(
                    plugin_id = %plugin.id,
                    source = %plugin.source,
                    "plugin already registered, ignoring duplicate"
                );
                continue;
            }
            tracing::debug!(plugin_id = %plugin.id, source = %plugin.source, "registered plugin");
            self.plugins.push(plugin);
        }
    }

    async fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::App("application already started".to_string()));
        }

        let provided: HashSet<&str> = self
            .plugins
            .iter()
            .filter_map(|p| p.provides.as_deref())
            .collect();

        for plugin in self.plugins.iter().filter(|p| p.auto_start == Some(true)) {
            let missing: Vec<&str> = plugin
                .requires
                .iter()
                .map(String::as_str)
                .filter(|token| !provided.contains(token))
                .collect();

            if missing.is_empty() {
                self.activated.push(plugin.id.clone());
            } else {
                tracing::warn!(
                    plugin_id = %plugin.id,
                    missing = ?missing,
                    "plugin requirements not provided, not activating"
                );
            }
        }

        self.started = true;
        tracing::info!(
            public_path = %self.public_path,
            registered = self.plugins.len(),
            activated = self.activated.len(),
            "application started"
        );
        Ok(())
    }
}
