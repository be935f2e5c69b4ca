//! Tracking console configuration
//!
//! Loaded from a TOML file; every section and field is optional.
//!
//! ```toml
//! [styles]
//! root = "crates/sprig_track/styles"
//! login = "login.css"
//! dashboard = "dashboard.css"
//! # base_url = "http://127.0.0.1:5000/component/"
//!
//! [api]
//! login_url = "http://127.0.0.1:5000/api/login"
//!
//! [render]
//! max_depth = 64
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sprig_core::RenderConfig;
use sprig_style::{FileSource, StyleLoader, StyleSource};
use tracing::debug;

use crate::error::{Result, TrackError};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TrackConfig {
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where component stylesheets come from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StylesConfig {
    /// Directory that file locators resolve against
    #[serde(default = "default_styles_root")]
    pub root: PathBuf,
    /// When set, stylesheets are fetched over HTTP relative to this URL
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_login_styles")]
    pub login: String,
    #[serde(default = "default_dashboard_styles")]
    pub dashboard: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            root: default_styles_root(),
            base_url: None,
            login: default_login_styles(),
            dashboard: default_dashboard_styles(),
        }
    }
}

fn default_styles_root() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/styles"))
}

fn default_login_styles() -> String {
    "login.css".to_string()
}

fn default_dashboard_styles() -> String {
    "dashboard.css".to_string()
}

/// Login backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
        }
    }
}

fn default_login_url() -> String {
    "http://127.0.0.1:5000/api/login".to_string()
}

impl TrackConfig {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from `path`, falling back to defaults if it does
    /// not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| TrackError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Style loader for the configured source
    pub fn style_loader(&self) -> Result<StyleLoader> {
        Ok(StyleLoader::from_shared(self.style_source()?))
    }

    #[cfg(feature = "network")]
    fn style_source(&self) -> Result<Arc<dyn StyleSource>> {
        match &self.styles.base_url {
            Some(base) => Ok(Arc::new(sprig_style::HttpSource::with_base(base)?)),
            None => Ok(Arc::new(FileSource::new(self.styles.root.clone()))),
        }
    }

    #[cfg(not(feature = "network"))]
    fn style_source(&self) -> Result<Arc<dyn StyleSource>> {
        if let Some(base) = &self.styles.base_url {
            tracing::warn!(base = %base, "built without network support, loading styles from disk");
        }
        Ok(Arc::new(FileSource::new(self.styles.root.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrackConfig::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, TrackConfig::default());
        assert_eq!(config.styles.login, "login.css");
        assert_eq!(config.render.max_depth, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nlogin_url = \"http://tracking.test/api/login\"\n\n[render]\nmax_depth = 16").unwrap();

        let config = TrackConfig::load(file.path()).unwrap();
        assert_eq!(config.api.login_url, "http://tracking.test/api/login");
        assert_eq!(config.render.max_depth, Some(16));
        assert_eq!(config.styles, StylesConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TrackConfig::parse("[render]\nmax_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, TrackError::ConfigParse(_)));
    }

    #[tokio::test]
    async fn test_default_loader_reads_bundled_styles() {
        let config = TrackConfig::default();
        let loader = config.style_loader().unwrap();
        let sheet = loader.load(&config.styles.dashboard).await.unwrap();
        assert!(sheet.rules_for(".status-pill.delivered").count() > 0);
    }
}
