//! Asynchronous style loading
//!
//! [`StyleLoader`] pairs a [`StyleSource`] with the parser: fetch, then parse
//! into a shareable [`Stylesheet`]. There is no cache; each
//! load goes back to the source.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Result, StyleError};
use crate::parser::Stylesheet;
use crate::source::StyleSource;

/// Fetches and parses stylesheets from a source
#[derive(Clone)]
pub struct StyleLoader {
    source: Arc<dyn StyleSource>,
}

impl StyleLoader {
    pub fn new<S: StyleSource + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_shared(source: Arc<dyn StyleSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn StyleSource> {
        &self.source
    }

    /// Fetch `locator` and parse it
    ///
    /// Suspends until the source resolves. Fetch and parse failures are
    /// returned as-is; nothing is retried.
    pub async fn load(&self, locator: &str) -> Result<Arc<Stylesheet>> {
        trace!(source = self.source.name(), locator, "fetching stylesheet");
        let text = self.source.fetch(locator).await?;

        let sheet = Stylesheet::parse(&text).map_err(|source| StyleError::Parse {
            locator: locator.to_string(),
            source,
        })?;

        debug!(
            source = self.source.name(),
            locator,
            rules = sheet.len(),
            "stylesheet loaded"
        );
        Ok(Arc::new(sheet))
    }
}

impl std::fmt::Debug for StyleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleLoader")
            .field("source", &self.source.name())
            .finish()
    }
}
