//! Lifecycle controller
//!
//! [`Lifecycle`] composes a base [`Element`] with a consumer [`Component`]
//! and sequences every lifecycle event in a fixed order: base hook first,
//! then the consumer hook, then (conditionally) a render pass.
//!
//! ```text
//! [Constructed] --mount--> [Connected] --unmount--> [Disconnected]
//! ```
//!
//! Hosts that drive heterogeneous instances use the object-safe
//! [`Mountable`] trait instead of the concrete type.

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sprig_style::{StyleLoader, Stylesheet};
use tracing::{debug, trace};

use crate::component::{Component, Context};
use crate::element::Element;
use crate::error::{CoreError, Result};
use crate::reactive::{PropValue, Properties};
use crate::scope::RenderRoot;

/// Where an instance is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Constructed,
    Connected,
    Disconnected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Constructed => "constructed",
            Phase::Connected => "connected",
            Phase::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Render pass configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum nesting of render passes triggered from within a render
    ///
    /// `None` leaves recursion unguarded.
    pub max_depth: Option<u32>,
}

impl RenderConfig {
    pub fn with_max_depth(limit: u32) -> Self {
        Self {
            max_depth: Some(limit),
        }
    }
}

/// Per-instance render counters
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Passes that injected markup
    pub renders: u64,
    /// Passes where `render` returned [`Rendered::Skip`](crate::Rendered::Skip)
    pub skipped: u64,
    /// Deepest nesting reached by a render pass
    pub max_depth_seen: u32,
    pub last_render: Option<Instant>,
}

impl RenderStats {
    pub(crate) fn record_render(&mut self, depth: u32) {
        self.renders += 1;
        self.max_depth_seen = self.max_depth_seen.max(depth);
        self.last_render = Some(Instant::now());
    }
}

/// Controller state shared with hook contexts
#[derive(Debug)]
pub(crate) struct Runtime {
    pub(crate) phase: Phase,
    pub(crate) config: RenderConfig,
    pub(crate) stats: RenderStats,
    pub(crate) depth: u32,
    pub(crate) style_requests: Vec<String>,
}

impl Runtime {
    fn new(config: RenderConfig) -> Self {
        Self {
            phase: Phase::Constructed,
            config,
            stats: RenderStats::default(),
            depth: 0,
            style_requests: Vec::new(),
        }
    }
}

/// Observed attribute names, computed once per `(E, C)` pair
static OBSERVED_ATTRIBUTES: LazyLock<Mutex<FxHashMap<TypeId, Arc<[String]>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// A component instance: base element plus consumer
pub struct Lifecycle<E: Element, C: Component> {
    element: E,
    component: C,
    props: Properties,
    runtime: Runtime,
}

impl<E: Element + 'static, C: Component + 'static> Lifecycle<E, C> {
    pub fn new(element: E, component: C) -> Self {
        Self::with_config(element, component, RenderConfig::default())
    }

    pub fn with_config(element: E, component: C, config: RenderConfig) -> Self {
        Self {
            element,
            component,
            props: Properties::new(),
            runtime: Runtime::new(config),
        }
    }

    fn context(&mut self) -> Context<'_, C> {
        Context {
            component: &self.component,
            element: &mut self.element,
            props: &mut self.props,
            runtime: &mut self.runtime,
        }
    }

    // =========================================================================
    // LIFECYCLE EVENTS
    // =========================================================================

    /// Mount: base mount hook, `connect`, then the first render pass
    ///
    /// A failing `connect` leaves the instance connected without a first
    /// render.
    pub fn mount(&mut self) -> Result<()> {
        self.transition(Phase::Constructed, "mount")?;

        self.element.on_mount();
        self.runtime.phase = Phase::Connected;
        debug!(component = std::any::type_name::<C>(), "mounted");

        let mut cx = self.context();
        let component = cx.component;
        component
            .connect(&mut cx)
            .map_err(|e| CoreError::hook("connect", e))?;
        cx.render_pass()
    }

    /// Unmount: base unmount hook, then `disconnect`
    pub fn unmount(&mut self) -> Result<()> {
        self.transition(Phase::Connected, "unmount")?;

        self.element.on_unmount();
        self.runtime.phase = Phase::Disconnected;
        debug!(component = std::any::type_name::<C>(), "unmounted");

        let mut cx = self.context();
        let component = cx.component;
        component
            .disconnect(&mut cx)
            .map_err(|e| CoreError::hook("disconnect", e))
    }

    fn transition(&self, expected: Phase, event: &'static str) -> Result<()> {
        if self.runtime.phase == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.runtime.phase,
                event,
            })
        }
    }

    /// Host notification that an observed attribute changed
    ///
    /// The base hook always runs. Identical values stop there; otherwise
    /// `will_update` runs with the values as `PropValue::String` (or `Null`
    /// for an absent attribute), followed by one render pass.
    pub fn attribute_changed(&mut self, name: &str, old: Option<&str>, new: Option<&str>) -> Result<()> {
        self.element.on_attribute_changed(name, old, new);
        if old == new {
            trace!(attribute = name, "unchanged attribute ignored");
            return Ok(());
        }

        let old = attribute_value(old);
        let new = attribute_value(new);
        let mut cx = self.context();
        let component = cx.component;
        component
            .will_update(&mut cx, name, &old, &new)
            .map_err(|e| CoreError::hook("will_update", e))?;
        cx.render_pass()
    }

    /// Store an attribute, notifying if its name is observed
    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let old = self.element.store_attribute(name, value.map(str::to_string));
        if !Self::observed_attributes().iter().any(|observed| observed == name) {
            return Ok(());
        }
        self.attribute_changed(name, old.as_deref(), value)
    }

    /// Union of the base type's and the consumer's observed attribute names
    ///
    /// De-duplicated, base names first. Computed on first use and shared by
    /// every instance of the same `(E, C)` pair.
    pub fn observed_attributes() -> Arc<[String]> {
        let mut cache = OBSERVED_ATTRIBUTES.lock().unwrap();
        cache
            .entry(TypeId::of::<(E, C)>())
            .or_insert_with(|| {
                let mut names: Vec<String> = Vec::new();
                for name in E::observed_attributes().into_iter().chain(C::ATTRS.iter().copied()) {
                    if !names.iter().any(|existing| existing == name) {
                        names.push(name.to_string());
                    }
                }
                trace!(component = std::any::type_name::<C>(), ?names, "observed attributes");
                names.into()
            })
            .clone()
    }

    // =========================================================================
    // PROPERTIES & RENDERING
    // =========================================================================

    pub fn declare_property(&mut self, name: impl Into<String>, initial: impl Into<PropValue>) {
        self.props.declare(name, initial);
    }

    pub fn declare_properties<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropValue>,
    {
        self.props.declare_all(properties);
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Current value of a property, deserialized into `T`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.props
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Write a reactive property from outside the component
    ///
    /// Same semantics as [`Context::set_property`].
    pub fn set_property(&mut self, name: &str, value: impl Into<PropValue>) -> Result<bool> {
        self.context().set_property(name, value)
    }

    /// Run one render pass now
    pub fn render_now(&mut self) -> Result<()> {
        self.context().render_pass()
    }

    // =========================================================================
    // STYLES
    // =========================================================================

    /// Load a stylesheet and adopt it into this instance's render root
    ///
    /// Replaces any previously adopted sheet. Errors propagate unchanged.
    pub async fn apply_styles(&mut self, loader: &StyleLoader, locator: &str) -> Result<()> {
        let sheet = loader.load(locator).await?;
        self.element.root_mut().adopt_stylesheet(sheet);
        debug!(component = std::any::type_name::<C>(), locator, "styles applied");
        Ok(())
    }

    /// Load every stylesheet requested from hooks, in request order
    ///
    /// The queue is drained up front; a failure abandons the remaining
    /// requests. Returns the number of sheets adopted.
    pub async fn flush_styles(&mut self, loader: &StyleLoader) -> Result<usize> {
        let requests = std::mem::take(&mut self.runtime.style_requests);
        let mut adopted = 0;
        for locator in &requests {
            self.apply_styles(loader, locator).await?;
            adopted += 1;
        }
        Ok(adopted)
    }

    /// Style loads queued by hooks and not yet flushed
    pub fn pending_styles(&self) -> &[String] {
        &self.runtime.style_requests
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn root(&self) -> &RenderRoot {
        self.element.root()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn properties(&self) -> &Properties {
        &self.props
    }

    pub fn phase(&self) -> Phase {
        self.runtime.phase
    }

    pub fn stats(&self) -> &RenderStats {
        &self.runtime.stats
    }
}

fn attribute_value(value: Option<&str>) -> PropValue {
    value.map_or(PropValue::Null, |v| PropValue::String(v.to_string()))
}

impl<E: Element, C: Component> fmt::Debug for Lifecycle<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("component", &std::any::type_name::<C>())
            .field("phase", &self.runtime.phase)
            .field("properties", &self.props)
            .field("renders", &self.runtime.stats.renders)
            .finish()
    }
}

// =============================================================================
// TYPE-ERASED INSTANCES
// =============================================================================

/// Object-safe view of a component instance
pub trait Mountable {
    fn mount(&mut self) -> Result<()>;

    fn unmount(&mut self) -> Result<()>;

    /// Store an attribute and notify if it is observed
    fn set_attribute(&mut self, name: &str, value: Option<&str>) -> Result<()>;

    fn phase(&self) -> Phase;

    fn root(&self) -> &RenderRoot;

    fn observed(&self) -> Arc<[String]>;

    /// Take the style loads queued by hooks
    fn take_style_requests(&mut self) -> Vec<String>;

    fn adopt_stylesheet(&mut self, sheet: Arc<Stylesheet>);

    fn stats(&self) -> &RenderStats;

    /// Consumer type name, for diagnostics
    fn component_name(&self) -> &'static str;
}

impl<E: Element + 'static, C: Component + 'static> Mountable for Lifecycle<E, C> {
    fn mount(&mut self) -> Result<()> {
        Lifecycle::mount(self)
    }

    fn unmount(&mut self) -> Result<()> {
        Lifecycle::unmount(self)
    }

    fn set_attribute(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        Lifecycle::set_attribute(self, name, value)
    }

    fn phase(&self) -> Phase {
        self.runtime.phase
    }

    fn root(&self) -> &RenderRoot {
        self.element.root()
    }

    fn observed(&self) -> Arc<[String]> {
        Self::observed_attributes()
    }

    fn take_style_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.runtime.style_requests)
    }

    fn adopt_stylesheet(&mut self, sheet: Arc<Stylesheet>) {
        self.element.root_mut().adopt_stylesheet(sheet);
    }

    fn stats(&self) -> &RenderStats {
        &self.runtime.stats
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }
}

/// Flush the queued style loads of a type-erased instance
pub async fn load_requested_styles(instance: &mut dyn Mountable, loader: &StyleLoader) -> Result<usize> {
    let requests = instance.take_style_requests();
    for locator in &requests {
        let sheet = loader.load(locator).await?;
        instance.adopt_stylesheet(sheet);
    }
    debug!(
        component = instance.component_name(),
        count = requests.len(),
        "requested styles loaded"
    );
    Ok(requests.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Rendered;
    use crate::element::BaseElement;
    use crate::error::HookResult;
    use serde_json::json;
    use sprig_style::MemorySource;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Base element that records its native hooks
    struct LoggingElement {
        inner: BaseElement,
        log: Log,
    }

    impl Element for LoggingElement {
        fn observed_attributes() -> Vec<&'static str> {
            vec!["theme", "size"]
        }

        fn root(&self) -> &RenderRoot {
            self.inner.root()
        }

        fn root_mut(&mut self) -> &mut RenderRoot {
            self.inner.root_mut()
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.inner.attribute(name)
        }

        fn store_attribute(&mut self, name: &str, value: Option<String>) -> Option<String> {
            self.inner.store_attribute(name, value)
        }

        fn on_mount(&mut self) {
            self.log.borrow_mut().push("base:mount".into());
        }

        fn on_unmount(&mut self) {
            self.log.borrow_mut().push("base:unmount".into());
        }

        fn on_attribute_changed(&mut self, name: &str, _old: Option<&str>, _new: Option<&str>) {
            self.log.borrow_mut().push(format!("base:attr:{name}"));
        }
    }

    struct Probe {
        log: Log,
    }

    impl Component for Probe {
        const ATTRS: &'static [&'static str] = &["size", "label"];

        fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
            self.log.borrow_mut().push("connect".into());
            cx.declare_property("count", 0);
            cx.apply_styles("probe.css");
            Ok(())
        }

        fn disconnect(&self, _cx: &mut Context<'_, Self>) -> HookResult {
            self.log.borrow_mut().push("disconnect".into());
            Ok(())
        }

        fn will_update(
            &self,
            cx: &mut Context<'_, Self>,
            name: &str,
            old: &PropValue,
            new: &PropValue,
        ) -> HookResult {
            let stored = cx.property(name).cloned().unwrap_or(PropValue::Null);
            self.log
                .borrow_mut()
                .push(format!("will_update:{name}:{old}->{new}:stored={stored}"));
            Ok(())
        }

        fn render(&self, cx: &Context<'_, Self>) -> Rendered {
            let count: i64 = cx.get("count").unwrap_or_default();
            self.log.borrow_mut().push(format!("render:{count}"));
            format!("<span>{count}</span>").into()
        }
    }

    fn probe() -> (Lifecycle<LoggingElement, Probe>, Log) {
        let log: Log = Rc::default();
        let element = LoggingElement {
            inner: BaseElement::new(),
            log: log.clone(),
        };
        (Lifecycle::new(element, Probe { log: log.clone() }), log)
    }

    #[test]
    fn test_mount_order_base_connect_render() {
        let (mut instance, log) = probe();
        assert_eq!(instance.phase(), Phase::Constructed);

        instance.mount().unwrap();
        assert_eq!(*log.borrow(), vec!["base:mount", "connect", "render:0"]);
        assert_eq!(instance.phase(), Phase::Connected);
        assert_eq!(instance.stats().renders, 1);
        assert_eq!(instance.root().inner_html(), "<span>0</span>");

        instance.unmount().unwrap();
        assert_eq!(&log.borrow()[3..], ["base:unmount", "disconnect"]);
        assert_eq!(instance.phase(), Phase::Disconnected);
    }

    #[test]
    fn test_count_scenario() {
        let (mut instance, log) = probe();
        instance.mount().unwrap();
        log.borrow_mut().clear();

        // Equal write: no hook, no render
        assert!(!instance.set_property("count", 0).unwrap());
        assert!(log.borrow().is_empty());
        assert_eq!(instance.stats().renders, 1);

        // Changing write: will_update sees the old stored value, then one render
        assert!(instance.set_property("count", 1).unwrap());
        assert_eq!(
            *log.borrow(),
            vec!["will_update:count:0->1:stored=0", "render:1"]
        );
        assert_eq!(instance.stats().renders, 2);
        assert_eq!(instance.root().inner_html(), "<span>1</span>");
    }

    #[test]
    fn test_each_changing_write_renders() {
        let (mut instance, _log) = probe();
        instance.mount().unwrap();
        for n in 1..=5 {
            instance.set_property("count", n).unwrap();
        }
        assert_eq!(instance.stats().renders, 6);
        assert_eq!(instance.get::<i64>("count"), Some(5));
        assert_eq!(instance.properties().version("count"), Some(5));
    }

    #[test]
    fn test_unknown_property_write_fails() {
        let (mut instance, _log) = probe();
        instance.mount().unwrap();
        let err = instance.set_property("missing", json!(1)).unwrap_err();
        assert!(matches!(err, CoreError::UnknownProperty(name) if name == "missing"));
    }

    #[test]
    fn test_attribute_changes() {
        let (mut instance, log) = probe();
        instance.mount().unwrap();
        log.borrow_mut().clear();

        instance.attribute_changed("size", Some("m"), Some("m")).unwrap();
        assert_eq!(*log.borrow(), vec!["base:attr:size"]);
        assert_eq!(instance.stats().renders, 1);

        log.borrow_mut().clear();
        instance.attribute_changed("size", None, Some("l")).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["base:attr:size", "will_update:size:null->\"l\":stored=null", "render:0"]
        );
        assert_eq!(instance.stats().renders, 2);
    }

    #[test]
    fn test_set_attribute_only_notifies_observed() {
        let (mut instance, log) = probe();
        instance.mount().unwrap();
        log.borrow_mut().clear();

        instance.set_attribute("title", Some("hello")).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(instance.element().attribute("title"), Some("hello"));

        instance.set_attribute("label", Some("hi")).unwrap();
        instance.set_attribute("label", Some("hi")).unwrap();
        assert_eq!(instance.stats().renders, 2);
    }

    #[test]
    fn test_observed_attributes_union_cached() {
        let first = Lifecycle::<LoggingElement, Probe>::observed_attributes();
        assert_eq!(&*first, ["theme", "size", "label"]);

        let second = Lifecycle::<LoggingElement, Probe>::observed_attributes();
        assert!(Arc::ptr_eq(&first, &second));
    }

    struct Silent;

    impl Component for Silent {}

    #[test]
    fn test_skip_render_is_not_counted() {
        let mut instance = Lifecycle::new(BaseElement::new(), Silent);
        instance.mount().unwrap();
        instance.render_now().unwrap();
        assert_eq!(instance.stats().renders, 0);
        assert_eq!(instance.stats().skipped, 2);
        assert_eq!(instance.root().generation(), 0);
    }

    /// Copies the `label` attribute into the `text` property
    struct Mirror;

    impl Component for Mirror {
        const ATTRS: &'static [&'static str] = &["label"];

        fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
            cx.declare_property("text", "new");
            Ok(())
        }

        fn will_update(
            &self,
            cx: &mut Context<'_, Self>,
            name: &str,
            _old: &PropValue,
            new: &PropValue,
        ) -> HookResult {
            if name == "label" {
                cx.set_property("text", new.clone())?;
            }
            Ok(())
        }

        fn render(&self, cx: &Context<'_, Self>) -> Rendered {
            format!("<b>{}</b>", cx.get::<String>("text").unwrap_or_default()).into()
        }
    }

    #[test]
    fn test_attribute_synced_into_property() {
        let mut instance = Lifecycle::new(BaseElement::new(), Mirror);
        instance.mount().unwrap();
        assert_eq!(instance.root().inner_html(), "<b>new</b>");

        // One pass for the nested property write, one for the attribute
        instance.set_attribute("label", Some("sale")).unwrap();
        assert_eq!(instance.property("text"), Some(&json!("sale")));
        assert_eq!(instance.root().inner_html(), "<b>sale</b>");
        assert_eq!(instance.stats().renders, 3);

        instance.set_attribute("label", Some("sale")).unwrap();
        assert_eq!(instance.stats().renders, 3);

        instance.set_attribute("label", None).unwrap();
        assert_eq!(instance.property("text"), Some(&PropValue::Null));
        assert_eq!(instance.root().inner_html(), "<b></b>");
        assert_eq!(instance.stats().renders, 5);
    }

    /// Writes a property from `did_render` on every pass
    struct Runaway;

    impl Component for Runaway {
        fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
            cx.declare_property("n", 0);
            Ok(())
        }

        fn render(&self, cx: &Context<'_, Self>) -> Rendered {
            format!("{}", cx.get::<i64>("n").unwrap_or_default()).into()
        }

        fn did_render(&self, cx: &mut Context<'_, Self>) -> HookResult {
            let n: i64 = cx.get("n").unwrap_or_default();
            cx.set_property("n", n + 1)?;
            Ok(())
        }
    }

    #[test]
    fn test_depth_guard_stops_recursion() {
        let mut instance =
            Lifecycle::with_config(BaseElement::new(), Runaway, RenderConfig::with_max_depth(5));
        let err = instance.mount().unwrap_err();

        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        let mut limit_hit = None;
        while let Some(current) = source {
            if let Some(CoreError::RenderDepthExceeded { limit }) = current.downcast_ref::<CoreError>() {
                limit_hit = Some(*limit);
            }
            source = current.source();
        }

        assert_eq!(limit_hit, Some(5));
        assert_eq!(instance.stats().renders, 5);
        assert_eq!(instance.stats().max_depth_seen, 5);
        assert_eq!(instance.root().inner_html(), "4");
    }

    struct Failing;

    impl Component for Failing {
        fn connect(&self, _cx: &mut Context<'_, Self>) -> HookResult {
            Err("connect exploded".into())
        }

        fn render(&self, _cx: &Context<'_, Self>) -> Rendered {
            "<p>never</p>".into()
        }
    }

    #[test]
    fn test_hook_failure_propagates() {
        let mut instance = Lifecycle::new(BaseElement::new(), Failing);
        let err = instance.mount().unwrap_err();
        assert!(matches!(err, CoreError::Hook { hook: "connect", .. }));
        assert_eq!(err.to_string(), "Hook 'connect' failed: connect exploded");

        // Connected, but the first render never happened
        assert_eq!(instance.phase(), Phase::Connected);
        assert_eq!(instance.stats().renders, 0);
    }

    #[test]
    fn test_invalid_transitions() {
        let (mut instance, _log) = probe();
        let err = instance.unmount().unwrap_err();
        assert_eq!(err.to_string(), "Cannot unmount a component that is constructed");

        instance.mount().unwrap();
        assert!(matches!(
            instance.mount(),
            Err(CoreError::InvalidTransition {
                from: Phase::Connected,
                event: "mount"
            })
        ));

        instance.unmount().unwrap();
        assert!(instance.mount().is_err());
        assert!(instance.unmount().is_err());
    }

    #[tokio::test]
    async fn test_flush_styles_adopts_requested_sheets() {
        let source = Arc::new(MemorySource::new().with("probe.css", ".probe { color: red; }"));
        let loader = StyleLoader::from_shared(source.clone());

        let (mut instance, _log) = probe();
        instance.mount().unwrap();
        assert_eq!(instance.pending_styles(), ["probe.css"]);
        assert!(instance.root().adopted_stylesheet().is_none());

        assert_eq!(instance.flush_styles(&loader).await.unwrap(), 1);
        assert!(instance.pending_styles().is_empty());
        let sheet = instance.root().adopted_stylesheet().unwrap();
        assert_eq!(sheet.rules_for(".probe").count(), 1);
    }

    #[tokio::test]
    async fn test_every_instance_fetches_again() {
        let source = Arc::new(MemorySource::new().with("probe.css", ".probe { color: red; }"));
        let loader = StyleLoader::from_shared(source.clone());

        for _ in 0..3 {
            let (mut instance, _log) = probe();
            instance.mount().unwrap();
            instance.flush_styles(&loader).await.unwrap();
        }
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_style_failure_propagates() {
        let loader = StyleLoader::new(MemorySource::new());
        let mut instance = Lifecycle::new(BaseElement::new(), Silent);
        instance.mount().unwrap();

        let err = instance.apply_styles(&loader, "missing.css").await.unwrap_err();
        assert!(matches!(err, CoreError::Style(_)));
        assert!(instance.root().adopted_stylesheet().is_none());
    }

    #[tokio::test]
    async fn test_type_erased_style_loading() {
        let loader = StyleLoader::new(MemorySource::new().with("probe.css", ".probe { margin: 0; }"));
        let (instance, _log) = probe();
        let mut boxed: Box<dyn Mountable> = Box::new(instance);

        boxed.mount().unwrap();
        assert_eq!(load_requested_styles(boxed.as_mut(), &loader).await.unwrap(), 1);
        assert!(boxed.root().adopted_stylesheet().is_some());
        assert_eq!(&*boxed.observed(), ["theme", "size", "label"]);
    }
}
