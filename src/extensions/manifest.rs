//! Federated extension list parsing
//!
//! The host advertises its federated extensions as a JSON array:
//!
//! ```json
//! [
//!   {
//!     "name": "@ext/a",
//!     "load": "static/remoteEntry.json",
//!     "extension": "./extension",
//!     "style": "./style"
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// One advertised federated extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Extension (and remote container) name
    pub name: String,
    /// Entry point, relative to `<labextensions>/<name>/`
    pub load: String,
    /// Module exposing the extension's plugins
    #[serde(default, rename = "extension", skip_serializing_if = "Option::is_none")]
    pub extension_module: Option<String>,
    /// Module exposing MIME renderer plugins (recognized, not loaded)
    #[serde(default, rename = "mimeExtension", skip_serializing_if = "Option::is_none")]
    pub mime_extension_module: Option<String>,
    /// Module exposing the extension's styles
    #[serde(default, rename = "style", skip_serializing_if = "Option::is_none")]
    pub style_module: Option<String>,
}

impl ExtensionDescriptor {
    /// Resolve this extension's entry URL against the labextensions base
    ///
    /// # Errors
    ///
    /// Returns error if the joined URL is invalid
    pub fn entry_url(&self, labextensions_url: &Url) -> Result<Url> {
        resolve_entry(labextensions_url, &self.name, &self.load)
    }
}

/// Parse the federated extension list
///
/// Only the structure is checked. Failure here leaves the bootstrap with no
/// way to know which extensions exist, so callers treat it as fatal.
///
/// # Errors
///
/// Returns [`Error::ManifestParse`] if `raw` is not a JSON array of descriptors
pub fn parse(raw: &str) -> Result<Vec<ExtensionDescriptor>> {
    serde_json::from_str(raw).map_err(Error::ManifestParse)
}

/// Join `base`, the extension name, and its load path
///
/// # Errors
///
/// Returns error if the joined URL is invalid
pub fn resolve_entry(base: &Url, name: &str, load: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let dir = base.join(&format!("{}/", name.trim_matches('/')))?;
    Ok(dir.join(load.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_descriptors() {
        let raw = r#"[
            {"name": "@ext/a", "load": "static/remoteEntry.json", "extension": "./extension", "style": "./style"},
            {"name": "b", "load": "remoteEntry.json", "mimeExtension": "./mime"}
        ]"#;

        let descriptors = parse(raw).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].extension_module.as_deref(), Some("./extension"));
        assert_eq!(descriptors[0].style_module.as_deref(), Some("./style"));
        assert!(descriptors[0].mime_extension_module.is_none());
        assert_eq!(descriptors[1].mime_extension_module.as_deref(), Some("./mime"));
        assert!(descriptors[1].extension_module.is_none());
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_manifest_is_parse_error() {
        assert!(matches!(parse("{not json"), Err(Error::ManifestParse(_))));
        assert!(matches!(
            parse(r#"{"name": "a", "load": "x"}"#),
            Err(Error::ManifestParse(_))
        ));
        assert!(matches!(parse(r#"[{"name": "a"}]"#), Err(Error::ManifestParse(_))));
    }

    #[test]
    fn resolve_scoped_entry() {
        let base = Url::parse("http://localhost:8888/lab/extensions").unwrap();
        let url = resolve_entry(&base, "@ext/a", "static/remoteEntry.abc.json").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/lab/extensions/@ext/a/static/remoteEntry.abc.json"
        );
    }

    #[test]
    fn resolve_strips_extra_slashes() {
        let base = Url::parse("http://localhost:8888/lab/extensions/").unwrap();
        let url = resolve_entry(&base, "/b/", "/remoteEntry.json").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/lab/extensions/b/remoteEntry.json"
        );
    }

    #[test]
    fn descriptor_entry_url() {
        let descriptor = ExtensionDescriptor {
            name: "c".to_string(),
            load: "remoteEntry.json".to_string(),
            extension_module: None,
            mime_extension_module: None,
            style_module: None,
        };
        let base = Url::parse("file:///srv/labextensions/").unwrap();
        assert_eq!(
            descriptor.entry_url(&base).unwrap().as_str(),
            "file:///srv/labextensions/c/remoteEntry.json"
        );
    }
}
