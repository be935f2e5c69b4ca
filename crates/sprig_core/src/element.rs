//! Mountable base elements
//!
//! [`Element`] is the minimal interface the lifecycle controller composes
//! onto: it owns a render root and attributes, and exposes the native
//! mount/unmount/attribute-change notification points. [`BaseElement`] is
//! the default implementation; custom base types usually wrap one and add
//! their own hook bodies.

use indexmap::IndexMap;

use crate::scope::RenderRoot;

/// A base element type the lifecycle controller can drive
///
/// The notification hooks default to no-ops. The controller always calls
/// them before the consumer's hooks, so base behavior is augmented, never
/// replaced.
pub trait Element {
    /// Attributes the base type itself wants observed
    fn observed_attributes() -> Vec<&'static str>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// The instance's isolated render root
    fn root(&self) -> &RenderRoot;

    fn root_mut(&mut self) -> &mut RenderRoot;

    /// Current attribute value
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Store (or, with `None`, remove) an attribute, returning the old value
    ///
    /// This only updates storage; change notification is the controller's job.
    fn store_attribute(&mut self, name: &str, value: Option<String>) -> Option<String>;

    fn on_mount(&mut self) {}

    fn on_unmount(&mut self) {}

    fn on_attribute_changed(&mut self, _name: &str, _old: Option<&str>, _new: Option<&str>) {}
}

/// Default base element: a render root plus an attribute map
///
/// The root is attached at construction, so it exists before the instance
/// is ever mounted.
#[derive(Debug, Clone, Default)]
pub struct BaseElement {
    root: RenderRoot,
    attributes: IndexMap<String, String>,
}

impl BaseElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style initial attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Element for BaseElement {
    fn root(&self) -> &RenderRoot {
        &self.root
    }

    fn root_mut(&mut self) -> &mut RenderRoot {
        &mut self.root
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn store_attribute(&mut self, name: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(value) => self.attributes.insert(name.to_string(), value),
            None => self.attributes.shift_remove(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_element_attributes() {
        let mut element = BaseElement::new().with_attribute("theme", "dark");
        assert_eq!(element.attribute("theme"), Some("dark"));

        let old = element.store_attribute("theme", Some("light".into()));
        assert_eq!(old.as_deref(), Some("dark"));

        let old = element.store_attribute("theme", None);
        assert_eq!(old.as_deref(), Some("light"));
        assert_eq!(element.attribute("theme"), None);
    }

    #[test]
    fn test_base_element_has_root_before_mount() {
        let element = BaseElement::new();
        assert_eq!(element.root().inner_html(), "");
        assert_eq!(element.root().generation(), 0);
        assert!(BaseElement::observed_attributes().is_empty());
    }
}
