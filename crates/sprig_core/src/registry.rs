//! Custom element registry
//!
//! Associates custom tag names with constructors that yield type-erased
//! [`Mountable`] instances, so a host can create components by name.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::component::Component;
use crate::element::BaseElement;
use crate::error::{CoreError, Result};
use crate::lifecycle::{Lifecycle, Mountable, RenderConfig};

type Constructor = Box<dyn Fn(&RenderConfig) -> Box<dyn Mountable> + Send + Sync>;

/// Tag name to constructor map
#[derive(Default)]
pub struct ElementRegistry {
    constructors: FxHashMap<String, Constructor>,
    config: RenderConfig,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose instances all use `config`
    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            constructors: FxHashMap::default(),
            config,
        }
    }

    /// Register a constructor for `tag`
    ///
    /// Tags must be lowercase, start with a letter and contain a hyphen.
    /// Each tag can be defined once.
    pub fn define<F>(&mut self, tag: &str, constructor: F) -> Result<()>
    where
        F: Fn(&RenderConfig) -> Box<dyn Mountable> + Send + Sync + 'static,
    {
        if !is_valid_tag(tag) {
            return Err(CoreError::InvalidTagName(tag.to_string()));
        }
        if self.constructors.contains_key(tag) {
            return Err(CoreError::AlreadyDefined(tag.to_string()));
        }
        self.constructors.insert(tag.to_string(), Box::new(constructor));
        debug!(tag, "element defined");
        Ok(())
    }

    /// Register a `Default` consumer over [`BaseElement`]
    pub fn define_component<C>(&mut self, tag: &str) -> Result<()>
    where
        C: Component + Default + 'static,
    {
        self.define(tag, |config: &RenderConfig| -> Box<dyn Mountable> {
            Box::new(Lifecycle::with_config(BaseElement::new(), C::default(), config.clone()))
        })
    }

    /// Construct a fresh, unmounted instance of `tag`
    pub fn create(&self, tag: &str) -> Result<Box<dyn Mountable>> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| CoreError::UnknownTag(tag.to_string()))?;
        Ok(constructor(&self.config))
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("tags", &self.constructors.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

fn is_valid_tag(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}
