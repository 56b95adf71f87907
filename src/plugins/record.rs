//! Plugin records and module export normalization
//!
//! Extension modules export plugins in several shapes: a single plugin
//! object, an array of plugins, or either of those wrapped as the `default`
//! of an ES-module style object (`{"__esModule": true, "default": ...}`).
//! [`ModuleExports`] turns all of them into one ordered sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a plugin came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PluginSource {
    /// Compiled into the application
    #[default]
    Builtin,
    /// Provided by the named federated extension
    Federated(String),
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::Federated(name) => write!(f, "federated:{name}"),
        }
    }
}

/// A unit the application can register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Plugin identifier, conventionally `package:plugin`
    pub id: String,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the application should activate the plugin on start
    #[serde(default, rename = "autoStart", skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    /// Tokens that must be provided before activation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Tokens used when available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<String>,
    /// Token this plugin provides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides: Option<String>,
    /// Origin of the plugin, filled in by the bootstrap
    #[serde(skip)]
    pub source: PluginSource,
}

impl PluginRecord {
    /// Create a plugin with only an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            auto_start: None,
            requires: Vec::new(),
            optional: Vec::new(),
            provides: None,
            source: PluginSource::Builtin,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the plugin as auto-starting
    #[must_use]
    pub const fn auto_start(mut self) -> Self {
        self.auto_start = Some(true);
        self
    }

    /// Add a required token
    #[must_use]
    pub fn requires(mut self, token: impl Into<String>) -> Self {
        self.requires.push(token.into());
        self
    }

    /// Set the provided token
    #[must_use]
    pub fn provides(mut self, token: impl Into<String>) -> Self {
        self.provides = Some(token.into());
        self
    }
}

/// One plugin or an ordered list of plugins
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PluginExports {
    /// Array export
    Many(Vec<PluginRecord>),
    /// Single plugin export
    Single(PluginRecord),
}

impl PluginExports {
    /// Flatten into plugins, preserving order
    #[must_use]
    pub fn into_plugins(self) -> Vec<PluginRecord> {
        match self {
            Self::Many(plugins) => plugins,
            Self::Single(plugin) => vec![plugin],
        }
    }
}

impl From<PluginRecord> for PluginExports {
    fn from(plugin: PluginRecord) -> Self {
        Self::Single(plugin)
    }
}

impl From<Vec<PluginRecord>> for PluginExports {
    fn from(plugins: Vec<PluginRecord>) -> Self {
        Self::Many(plugins)
    }
}

/// Normalized exports of a plugin-providing module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleExports {
    /// ES module: plugins live under `default`
    EsModule(PluginExports),
    /// CommonJS module: the value itself is the export
    CommonJs(PluginExports),
}

impl ModuleExports {
    /// Marker key identifying ES-module shaped exports
    pub const ES_MODULE_KEY: &'static str = "__esModule";

    /// Normalize a raw JSON export value
    ///
    /// # Errors
    ///
    /// Returns error if an ES-module export has no `default`, or if the
    /// exported value is neither a plugin object nor an array of them
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let is_es_module = value
            .as_object()
            .is_some_and(|obj| obj.contains_key(Self::ES_MODULE_KEY));

        if is_es_module {
            let default = value
                .get("default")
                .cloned()
                .ok_or_else(|| Error::Exports("ES module export has no default".to_string()))?;
            Ok(Self::EsModule(serde_json::from_value(default)?))
        } else {
            Ok(Self::CommonJs(serde_json::from_value(value)?))
        }
    }

    /// The plugins in export order
    #[must_use]
    pub fn into_plugins(self) -> Vec<PluginRecord> {
        match self {
            Self::EsModule(exports) | Self::CommonJs(exports) => exports.into_plugins(),
        }
    }
}

impl From<PluginExports> for ModuleExports {
    fn from(exports: PluginExports) -> Self {
        Self::CommonJs(exports)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(exports: ModuleExports) -> Vec<String> {
        exports.into_plugins().into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn single_plugin_export() {
        let exports = ModuleExports::from_value(json!({"id": "a:x"})).unwrap();
        assert!(matches!(exports, ModuleExports::CommonJs(PluginExports::Single(_))));
        assert_eq!(ids(exports), vec!["a:x"]);
    }

    #[test]
    fn array_export_keeps_order() {
        let exports =
            ModuleExports::from_value(json!([{"id": "a:z"}, {"id": "a:x"}, {"id": "a:y"}]))
                .unwrap();
        assert_eq!(ids(exports), vec!["a:z", "a:x", "a:y"]);
    }

    #[test]
    fn es_module_default_is_unwrapped() {
        let exports = ModuleExports::from_value(json!({
            "__esModule": true,
            "default": [{"id": "a:x", "autoStart": true}, {"id": "a:y"}]
        }))
        .unwrap();
        assert!(matches!(exports, ModuleExports::EsModule(_)));

        let plugins = exports.into_plugins();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].auto_start, Some(true));
        assert_eq!(plugins[1].id, "a:y");
    }

    #[test]
    fn es_module_without_default_fails() {
        assert!(ModuleExports::from_value(json!({"__esModule": true})).is_err());
    }

    #[test]
    fn non_plugin_value_fails() {
        assert!(ModuleExports::from_value(json!("not a plugin")).is_err());
        assert!(ModuleExports::from_value(json!({"name": "missing id"})).is_err());
    }

    #[test]
    fn deserialize_full_record() {
        let plugin: PluginRecord = serde_json::from_value(json!({
            "id": "@ext/a:main",
            "description": "Main plugin",
            "autoStart": true,
            "requires": ["paths"],
            "optional": ["status"],
            "provides": "a-tracker"
        }))
        .unwrap();

        assert_eq!(plugin.requires, vec!["paths"]);
        assert_eq!(plugin.optional, vec!["status"]);
        assert_eq!(plugin.provides.as_deref(), Some("a-tracker"));
        assert_eq!(plugin.source, PluginSource::Builtin);
    }
}
