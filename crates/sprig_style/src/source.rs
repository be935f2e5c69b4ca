//! Style sources
//!
//! A [`StyleSource`] turns a locator (a path such as
//! `/component/login/login.css` or a full URL) into stylesheet text. Sources
//! are read-only and uncached: every call performs a fresh fetch.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::error::{Result, StyleError};

/// Something that can fetch stylesheet text by locator
#[async_trait]
pub trait StyleSource: Send + Sync {
    /// Fetch the textual body behind `locator`
    async fn fetch(&self, locator: &str) -> Result<String>;

    /// Short name for diagnostics ("file", "http", "memory")
    fn name(&self) -> &'static str;
}

// =============================================================================
// FILE SOURCE
// =============================================================================

/// Reads stylesheets from a directory on disk
///
/// Locators are resolved relative to the root; a leading `/` is ignored so
/// that web-style paths map onto the served directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a locator onto a path under the root
    ///
    /// Locators that climb out of the root (`..`) are rejected.
    pub fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let relative = Path::new(locator.trim_start_matches('/'));
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return Err(StyleError::InvalidLocator(locator.to_string())),
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl StyleSource for FileSource {
    async fn fetch(&self, locator: &str) -> Result<String> {
        let path = self.resolve(locator)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StyleError::NotFound(locator.to_string())
            } else {
                StyleError::Fetch {
                    locator: locator.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

// =============================================================================
// MEMORY SOURCE
// =============================================================================

/// In-memory stylesheets keyed by locator
///
/// Useful for embedding styles in a binary and for tests. Counts fetches so
/// callers can observe that nothing is cached.
#[derive(Debug, Default)]
pub struct MemorySource {
    sheets: RwLock<FxHashMap<String, String>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(self, locator: impl Into<String>, css: impl Into<String>) -> Self {
        self.insert(locator, css);
        self
    }

    pub fn insert(&self, locator: impl Into<String>, css: impl Into<String>) {
        self.sheets
            .write()
            .unwrap()
            .insert(locator.into(), css.into());
    }

    pub fn remove(&self, locator: &str) {
        self.sheets.write().unwrap().remove(locator);
    }

    /// Total number of fetches served, including misses
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StyleSource for MemorySource {
    async fn fetch(&self, locator: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.sheets
            .read()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| StyleError::NotFound(locator.to_string()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// HTTP SOURCE
// =============================================================================

/// Fetches stylesheets over HTTP(S)
///
/// Relative locators are joined onto the base URL. No caching headers are
/// sent and no authentication is performed.
#[cfg(feature = "network")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Option<reqwest::Url>,
}

#[cfg(feature = "network")]
impl HttpSource {
    /// Source that only accepts absolute URLs
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base: None,
        }
    }

    /// Source that resolves relative locators against `base`
    pub fn with_base(base: &str) -> Result<Self> {
        let base = reqwest::Url::parse(base)
            .map_err(|_| StyleError::InvalidLocator(base.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base: Some(base),
        })
    }

    pub fn resolve(&self, locator: &str) -> Result<reqwest::Url> {
        let resolved = match &self.base {
            Some(base) => base.join(locator),
            None => reqwest::Url::parse(locator),
        };
        resolved.map_err(|_| StyleError::InvalidLocator(locator.to_string()))
    }
}

#[cfg(feature = "network")]
impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "network")]
#[async_trait]
impl StyleSource for HttpSource {
    async fn fetch(&self, locator: &str) -> Result<String> {
        let url = self.resolve(locator)?;
        let fetch_error = |e: reqwest::Error| StyleError::Fetch {
            locator: locator.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        if !response.status().is_success() {
            return Err(StyleError::Status {
                locator: locator.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(fetch_error)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_resolve() {
        let source = FileSource::new("/srv/site");
        assert_eq!(
            source.resolve("/component/login/login.css").unwrap(),
            PathBuf::from("/srv/site/component/login/login.css")
        );
        assert_eq!(
            source.resolve("./app.css").unwrap(),
            PathBuf::from("/srv/site/app.css")
        );
        assert!(matches!(
            source.resolve("../secrets.css"),
            Err(StyleError::InvalidLocator(_))
        ));
    }

    #[tokio::test]
    async fn test_file_source_fetch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("component")).unwrap();
        std::fs::write(dir.path().join("component/app.css"), ".a { color: red; }").unwrap();

        let source = FileSource::new(dir.path());
        let css = source.fetch("/component/app.css").await.unwrap();
        assert_eq!(css, ".a { color: red; }");

        let missing = source.fetch("/component/missing.css").await;
        assert!(matches!(missing, Err(StyleError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_memory_source_counts_fetches() {
        let source = MemorySource::new().with("/app.css", ".a { color: red; }");

        assert!(source.fetch("/app.css").await.is_ok());
        assert!(source.fetch("/app.css").await.is_ok());
        assert!(source.fetch("/nope.css").await.is_err());
        assert_eq!(source.fetch_count(), 3);
    }

    #[cfg(feature = "network")]
    #[tokio::test]
    async fn test_http_source_status_and_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/component/app.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string(".a { color: red; }"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/component/gone.css"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::with_base(&server.uri()).unwrap();
        let css = source.fetch("/component/app.css").await.unwrap();
        assert_eq!(css, ".a { color: red; }");

        let err = source.fetch("/component/gone.css").await.unwrap_err();
        assert!(matches!(err, StyleError::Status { status: 404, .. }));
    }
}
