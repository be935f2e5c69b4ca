//! Consumer contract and hook context
//!
//! A consumer implements [`Component`] to supply markup and lifecycle hook
//! bodies. Every hook receives a [`Context`]: the instance-wide view of the
//! component's reactive properties, base element and render root.
//!
//! Writes made through [`Context::set_property`] run the full change path
//! synchronously: `will_update`, store, render pass. A hook that writes a
//! property therefore re-renders before it returns, and a `did_render` that
//! writes unconditionally recurses until the stack runs out (or until the
//! optional depth limit in [`RenderConfig`](crate::lifecycle::RenderConfig)
//! stops it).
//!
//! # Example
//!
//! ```rust
//! use sprig_core::{BaseElement, Component, Context, HookResult, Lifecycle, Rendered};
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
//!         cx.declare_property("count", 0);
//!         Ok(())
//!     }
//!
//!     fn render(&self, cx: &Context<'_, Self>) -> Rendered {
//!         let count: i64 = cx.get("count").unwrap_or_default();
//!         format!("<span>{}</span>", count).into()
//!     }
//! }
//!
//! let mut counter = Lifecycle::new(BaseElement::new(), Counter);
//! counter.mount().unwrap();
//! counter.set_property("count", 5).unwrap();
//! assert_eq!(counter.root().inner_html(), "<span>5</span>");
//! ```

use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::element::Element;
use crate::error::{CoreError, HookResult, Result};
use crate::lifecycle::{Phase, RenderStats, Runtime};
use crate::reactive::{PropValue, Properties};
use crate::scope::RenderRoot;

/// Output of a consumer's `render`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Markup that replaces the render root's contents
    Markup(String),
    /// Nothing to inject; the pass is skipped without error
    Skip,
}

impl From<String> for Rendered {
    fn from(html: String) -> Self {
        Rendered::Markup(html)
    }
}

impl From<&str> for Rendered {
    fn from(html: &str) -> Self {
        Rendered::Markup(html.to_string())
    }
}

impl From<Option<String>> for Rendered {
    fn from(html: Option<String>) -> Self {
        html.map_or(Rendered::Skip, Rendered::Markup)
    }
}

impl From<()> for Rendered {
    fn from(_: ()) -> Self {
        Rendered::Skip
    }
}

/// The consumer side of a component
///
/// Every hook is optional. Hooks take `&self`; per-instance data that should
/// trigger renders lives in reactive properties, anything else in the
/// consumer's own (interior-mutable) fields.
pub trait Component: Sized {
    /// Attribute names this consumer wants observed
    const ATTRS: &'static [&'static str] = &[];

    /// Runs on mount, after the base element's mount hook and before the
    /// first render. The usual place to declare properties and request styles.
    fn connect(&self, _cx: &mut Context<'_, Self>) -> HookResult {
        Ok(())
    }

    /// Runs on unmount, after the base element's unmount hook
    fn disconnect(&self, _cx: &mut Context<'_, Self>) -> HookResult {
        Ok(())
    }

    /// Runs before a changed property or attribute value is applied
    ///
    /// The old value is still stored while this runs, so writing `name`
    /// itself from here re-enters the hook without end. Mirror into a
    /// different property instead.
    fn will_update(
        &self,
        _cx: &mut Context<'_, Self>,
        _name: &str,
        _old: &PropValue,
        _new: &PropValue,
    ) -> HookResult {
        Ok(())
    }

    /// Produce markup from the current property values
    fn render(&self, _cx: &Context<'_, Self>) -> Rendered {
        Rendered::Skip
    }

    /// Runs after markup was injected into the render root
    fn did_render(&self, _cx: &mut Context<'_, Self>) -> HookResult {
        Ok(())
    }
}

/// Instance-wide view handed to consumer hooks
pub struct Context<'a, C: Component> {
    pub(crate) component: &'a C,
    pub(crate) element: &'a mut dyn Element,
    pub(crate) props: &'a mut Properties,
    pub(crate) runtime: &'a mut Runtime,
}

impl<'a, C: Component> Context<'a, C> {
    // =========================================================================
    // PROPERTIES
    // =========================================================================

    /// Declare a reactive property (redeclaration replaces silently)
    pub fn declare_property(&mut self, name: impl Into<String>, initial: impl Into<PropValue>) {
        self.props.declare(name, initial);
    }

    /// Declare several reactive properties at once
    pub fn declare_properties<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropValue>,
    {
        self.props.declare_all(properties);
    }

    /// Current value of a property
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Current value of a property, deserialized into `T`
    ///
    /// Returns `None` if the property is undeclared or has another shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.props
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn properties(&self) -> &Properties {
        self.props
    }

    /// Write a reactive property
    ///
    /// Equal values are ignored. Otherwise `will_update(name, old, new)` runs
    /// before the value is stored, then exactly one render pass executes.
    /// Returns whether the value changed.
    pub fn set_property(&mut self, name: &str, value: impl Into<PropValue>) -> Result<bool> {
        let value = value.into();
        let cell = self
            .props
            .reactive(name)
            .ok_or_else(|| CoreError::UnknownProperty(name.to_string()))?;

        if !cell.differs(&value) {
            trace!(property = name, "unchanged write ignored");
            return Ok(false);
        }
        let old = cell.get().clone();

        let component = self.component;
        component
            .will_update(self, name, &old, &value)
            .map_err(|e| CoreError::hook("will_update", e))?;

        trace!(property = name, %old, new = %value, "property updated");
        self.props.replace(name, value);
        self.render_pass()?;
        Ok(true)
    }

    // =========================================================================
    // RENDERING & STYLES
    // =========================================================================

    /// Run a render pass now
    pub fn request_render(&mut self) -> Result<()> {
        self.render_pass()
    }

    /// Queue a stylesheet load for this instance
    ///
    /// Hooks are synchronous, so the fetch starts once the host drives
    /// [`Lifecycle::flush_styles`](crate::lifecycle::Lifecycle::flush_styles).
    /// Rendering proceeds unstyled until then.
    pub fn apply_styles(&mut self, locator: impl Into<String>) {
        let locator = locator.into();
        trace!(locator = %locator, "style load requested");
        self.runtime.style_requests.push(locator);
    }

    pub fn root(&self) -> &RenderRoot {
        self.element.root()
    }

    // =========================================================================
    // ELEMENT
    // =========================================================================

    pub fn element(&self) -> &(dyn Element + 'a) {
        &*self.element
    }

    pub fn element_mut(&mut self) -> &mut (dyn Element + 'a) {
        &mut *self.element
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.element.attribute(name)
    }

    pub fn phase(&self) -> Phase {
        self.runtime.phase
    }

    pub fn stats(&self) -> &RenderStats {
        &self.runtime.stats
    }

    /// One render pass: render, inject, `did_render`
    pub(crate) fn render_pass(&mut self) -> Result<()> {
        if let Some(limit) = self.runtime.config.max_depth {
            if self.runtime.depth >= limit {
                warn!(
                    component = std::any::type_name::<C>(),
                    limit, "render depth limit reached"
                );
                return Err(CoreError::RenderDepthExceeded { limit });
            }
        }

        self.runtime.depth += 1;
        let result = self.run_render();
        self.runtime.depth -= 1;
        result
    }

    fn run_render(&mut self) -> Result<()> {
        let component = self.component;
        match component.render(self) {
            Rendered::Markup(html) => {
                self.element.root_mut().replace_contents(html);
                self.runtime.stats.record_render(self.runtime.depth);
                debug!(
                    component = std::any::type_name::<C>(),
                    depth = self.runtime.depth,
                    renders = self.runtime.stats.renders,
                    "rendered"
                );
                component
                    .did_render(self)
                    .map_err(|e| CoreError::hook("did_render", e))
            }
            Rendered::Skip => {
                self.runtime.stats.skipped += 1;
                trace!(component = std::any::type_name::<C>(), "render skipped");
                Ok(())
            }
        }
    }
}
