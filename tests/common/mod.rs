//! Shared test utilities

#![allow(dead_code)]

use federated_bootstrap::{Config, DisabledExtensions, SharedPackage};
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;

/// A directory of on-disk remote entries served through `file:` URLs
pub struct Bundles {
    dir: TempDir,
}

impl Bundles {
    /// Create an empty bundle directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create bundle dir"),
        }
    }

    /// Root every extension is resolved under
    #[must_use]
    pub fn labextensions_url(&self) -> Url {
        Url::from_directory_path(self.dir.path()).expect("bundle dir is absolute")
    }

    /// Write `<name>/remoteEntry.json`
    pub fn write_entry(&self, name: &str, entry: &Value) {
        let dir = self.dir.path().join(name);
        std::fs::create_dir_all(&dir).expect("failed to create extension dir");
        std::fs::write(
            dir.join("remoteEntry.json"),
            serde_json::to_string_pretty(entry).expect("failed to encode entry"),
        )
        .expect("failed to write entry");
    }
}

/// A descriptor advertising `remoteEntry.json` and the given modules
#[must_use]
pub fn descriptor(name: &str, extension: Option<&str>, style: Option<&str>) -> Value {
    let mut value = json!({"name": name, "load": "remoteEntry.json"});
    if let Some(module) = extension {
        value["extension"] = json!(module);
    }
    if let Some(module) = style {
        value["style"] = json!(module);
    }
    value
}

/// Build a config resolving extensions under `labextensions_url`
#[must_use]
pub fn config(labextensions_url: Url, extensions: &Value, disabled: &[&str]) -> Config {
    Config {
        base_url: Url::parse("http://localhost:8888/").expect("valid base url"),
        labextensions_url,
        federated_extensions: extensions.to_string(),
        disabled: DisabledExtensions::new(disabled.iter().map(ToString::to_string).collect()),
        shared: Vec::new(),
    }
}

/// Same as [`config`], with host shared packages
#[must_use]
pub fn config_with_shared(
    labextensions_url: Url,
    extensions: &Value,
    shared: Vec<SharedPackage>,
) -> Config {
    Config {
        shared,
        ..config(labextensions_url, extensions, &[])
    }
}

/// A plugins module exporting `ids` as an array
#[must_use]
pub fn plugins_module(ids: &[&str]) -> Value {
    let plugins: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    json!({"kind": "plugins", "exports": plugins})
}
