//! Isolated render roots
//!
//! Every component instance owns exactly one [`RenderRoot`]: the encapsulated
//! region holding its markup and its adopted stylesheet. A root is created
//! with its element and dropped with it; it is never shared or transferred.

use std::fmt::Write as _;
use std::sync::Arc;

use sprig_style::Stylesheet;

/// Per-instance markup and style scope
#[derive(Debug, Clone, Default)]
pub struct RenderRoot {
    html: String,
    stylesheet: Option<Arc<Stylesheet>>,
    generation: u64,
}

impl RenderRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current markup
    pub fn inner_html(&self) -> &str {
        &self.html
    }

    /// Replace the entire contents with `html`
    ///
    /// Markup is stored verbatim; nothing is validated or sanitized.
    pub fn replace_contents(&mut self, html: impl Into<String>) {
        self.html = html.into();
        self.generation += 1;
    }

    /// Number of times the contents were replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Adopt `sheet`, replacing any previously adopted stylesheet
    pub fn adopt_stylesheet(&mut self, sheet: Arc<Stylesheet>) -> Option<Arc<Stylesheet>> {
        self.stylesheet.replace(sheet)
    }

    pub fn adopted_stylesheet(&self) -> Option<&Arc<Stylesheet>> {
        self.stylesheet.as_ref()
    }

    /// Serialize the root as a declarative shadow-root template
    pub fn to_template(&self) -> String {
        let mut out = String::from("<template shadowrootmode=\"open\">\n");
        if let Some(sheet) = &self.stylesheet {
            let _ = write!(out, "<style>\n{}</style>\n", sheet);
        }
        out.push_str(self.html.trim());
        out.push_str("\n</template>");
        out
    }
}
