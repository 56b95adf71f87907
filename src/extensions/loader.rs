//! Remote entry loading
//!
//! [`RemoteLoader::load`] fetches an entry once, installs its container in
//! the registry, and brings the container into the shared scope before
//! anything is requested from it. There is no retry and no timeout.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{Error, Result};

use super::container::{RemoteContainer, RemoteEntry, RemoteRegistry};
use super::shared::ShareScopeInitializer;

/// Fetches the raw text of a remote entry
#[async_trait]
pub trait EntryFetcher: Send + Sync {
    /// Fetch the document at `url`
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be retrieved
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Fetcher for `http(s):` and `file:` URLs
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default HTTP client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher using an existing client
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntryFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        match url.scheme() {
            "http" | "https" => {
                let response = self.client.get(url.clone()).send().await?;

                if !response.status().is_success() {
                    return Err(Error::Fetch(format!("{url} returned {}", response.status())));
                }

                Ok(response.text().await?)
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::Fetch(format!("invalid file url: {url}")))?;
                Ok(tokio::fs::read_to_string(&path).await?)
            }
            scheme => Err(Error::Fetch(format!("unsupported scheme '{scheme}' in {url}"))),
        }
    }
}

/// Loads remote entries into a registry
#[derive(Clone)]
pub struct RemoteLoader {
    fetcher: Arc<dyn EntryFetcher>,
    registry: Arc<RemoteRegistry>,
    sharing: Arc<ShareScopeInitializer>,
}

impl RemoteLoader {
    /// Create a loader installing into `registry`
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn EntryFetcher>,
        registry: Arc<RemoteRegistry>,
        sharing: Arc<ShareScopeInitializer>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            sharing,
        }
    }

    /// Registry containers are installed into
    #[must_use]
    pub const fn registry(&self) -> &Arc<RemoteRegistry> {
        &self.registry
    }

    /// Shared-scope initializer run after each load
    #[must_use]
    pub const fn sharing(&self) -> &Arc<ShareScopeInitializer> {
        &self.sharing
    }

    /// Load the container `name` from `url` and initialize it
    ///
    /// A container already installed under `name` is reused without
    /// fetching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteLoad`] if the entry cannot be fetched or
    /// parsed, does not install a container named `name`, or fails
    /// shared-scope negotiation
    pub async fn load(&self, name: &str, url: &Url) -> Result<Arc<RemoteContainer>> {
        let container = if let Some(existing) = self.registry.get(name).await {
            tracing::debug!(name, "remote already loaded, reusing container");
            existing
        } else {
            self.fetch_and_install(name, url)
                .await
                .map_err(|e| load_error(name, &e))?
        };

        if let Err(e) = self.sharing.negotiate(&container).await {
            // A container that never joined the scope must not be reused
            self.registry.remove_if_same(&container).await;
            return Err(load_error(name, &e));
        }

        Ok(container)
    }

    async fn fetch_and_install(&self, name: &str, url: &Url) -> Result<Arc<RemoteContainer>> {
        tracing::debug!(name, %url, "fetching remote entry");

        let raw = self.fetcher.fetch(url).await?;
        let entry: RemoteEntry = serde_json::from_str(&raw)?;

        if entry.name != name {
            return Err(Error::Fetch(format!(
                "entry declares container '{}' instead of '{name}'",
                entry.name
            )));
        }

        let installed = self
            .registry
            .install(RemoteContainer::new(entry, url.clone()))
            .await;

        tracing::info!(name, %url, modules = installed.modules().len(), "loaded remote entry");
        Ok(installed)
    }
}

impl std::fmt::Debug for RemoteLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLoader")
            .field("registry", &self.registry)
            .field("sharing", &self.sharing)
            .finish_non_exhaustive()
    }
}

fn load_error(name: &str, cause: &Error) -> Error {
    Error::RemoteLoad {
        name: name.to_string(),
        reason: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::extensions::shared::{SharedPackage, SharedScope};

    #[derive(Default)]
    struct MapFetcher {
        documents: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.documents.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl EntryFetcher for MapFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.documents
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::Fetch(format!("{url} unreachable")))
        }
    }

    fn loader(fetcher: Arc<MapFetcher>) -> RemoteLoader {
        let sharing = Arc::new(ShareScopeInitializer::new(
            Arc::new(SharedScope::new()),
            Vec::new(),
        ));
        RemoteLoader::new(fetcher, Arc::new(RemoteRegistry::new()), sharing)
    }

    const A_URL: &str = "http://localhost/ext/a/remoteEntry.json";

    #[tokio::test]
    async fn load_installs_and_initializes() {
        let fetcher = Arc::new(MapFetcher::default().with(A_URL, r#"{"name": "a"}"#));
        let loader = loader(fetcher);

        let container = loader.load("a", &Url::parse(A_URL).unwrap()).await.unwrap();
        assert!(container.is_initialized());
        assert!(loader.registry().contains("a").await);
        assert_eq!(loader.sharing().negotiations(), 1);
    }

    #[tokio::test]
    async fn second_load_reuses_container() {
        let fetcher = Arc::new(MapFetcher::default().with(A_URL, r#"{"name": "a"}"#));
        let loader = loader(fetcher.clone());
        let url = Url::parse(A_URL).unwrap();

        let first = loader.load("a", &url).await.unwrap();
        let second = loader.load("a", &url).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.fetched.lock().unwrap().len(), 1);
        assert_eq!(loader.sharing().negotiations(), 1);
    }

    #[tokio::test]
    async fn unreachable_entry_is_load_error() {
        let loader = loader(Arc::new(MapFetcher::default()));
        let url = Url::parse("http://localhost/ext/b/remoteEntry.json").unwrap();

        let err = loader.load("b", &url).await.unwrap_err();
        assert!(matches!(err, Error::RemoteLoad { ref name, .. } if name == "b"));
        assert!(loader.registry().is_empty().await);
    }

    #[tokio::test]
    async fn malformed_entry_is_load_error() {
        let fetcher = Arc::new(MapFetcher::default().with(A_URL, "<script>"));
        let loader = loader(fetcher);

        let err = loader.load("a", &Url::parse(A_URL).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::RemoteLoad { .. }));
    }

    #[tokio::test]
    async fn mismatched_name_is_load_error() {
        let fetcher = Arc::new(MapFetcher::default().with(A_URL, r#"{"name": "other"}"#));
        let loader = loader(fetcher);

        let err = loader.load("a", &Url::parse(A_URL).unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("instead of 'a'"));
        assert!(loader.registry().names().await.is_empty());
    }

    #[tokio::test]
    async fn mismatched_name_does_not_claim_another_slot() {
        const B_URL: &str = "http://localhost/ext/b/remoteEntry.json";
        let fetcher = Arc::new(
            MapFetcher::default()
                .with(A_URL, r#"{"name": "b", "modules": {"./x": {"kind": "style", "href": "evil.css"}}}"#)
                .with(B_URL, r#"{"name": "b", "modules": {"./x": {"kind": "style", "href": "b.css"}}}"#),
        );
        let loader = loader(fetcher.clone());

        assert!(loader.load("a", &Url::parse(A_URL).unwrap()).await.is_err());
        let b = loader.load("b", &Url::parse(B_URL).unwrap()).await.unwrap();

        assert_eq!(b.url().as_str(), B_URL);
        assert_eq!(loader.registry().names().await, vec!["b"]);
        assert_eq!(fetcher.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_negotiation_leaves_registry_and_scope_untouched() {
        let scope = Arc::new(SharedScope::new());
        let sharing = Arc::new(ShareScopeInitializer::new(
            scope.clone(),
            vec![SharedPackage::new("ui", "1.0.0")],
        ));
        let fetcher = Arc::new(MapFetcher::default().with(
            A_URL,
            r#"{"name": "a", "shared": [
                {"name": "lib", "version": "9.9.9"},
                {"name": "ui", "version": "2.0.0", "singleton": true, "strictVersion": true}
            ]}"#,
        ));
        let loader = RemoteLoader::new(fetcher, Arc::new(RemoteRegistry::new()), sharing);

        let err = loader.load("a", &Url::parse(A_URL).unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::RemoteLoad { ref name, .. } if name == "a"));

        assert!(loader.registry().names().await.is_empty());
        assert!(scope.providers("lib").await.is_empty());
        assert_eq!(scope.providers("ui").await.len(), 1);
        assert_eq!(loader.sharing().negotiations(), 0);
    }

    #[tokio::test]
    async fn file_urls_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remoteEntry.json");
        std::fs::write(&path, r#"{"name": "disk"}"#).unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let body = HttpFetcher::new().fetch(&url).await.unwrap();
        assert!(body.contains("disk"));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected() {
        let url = Url::parse("ftp://example.com/remoteEntry.json").unwrap();
        assert!(matches!(
            HttpFetcher::new().fetch(&url).await,
            Err(Error::Fetch(_))
        ));
    }
}
