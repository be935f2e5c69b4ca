//! Sprig Core Runtime
//!
//! A minimal reactive component runtime that turns a plain element into a
//! stateful, self-rendering widget:
//!
//! - **Reactive Properties**: change-detected values whose writes re-render
//! - **Lifecycle Controller**: composes a consumer onto a base element and
//!   sequences mount, unmount, attribute-change and render events
//! - **Render Roots**: isolated per-instance markup and adopted styles
//! - **Element Registry**: custom tag names mapped to constructors
//! - **Event Bus**: named-event publish/subscribe
//! - **Shared Store**: a subscribable, shallow-merged state record
//!
//! # Example
//!
//! ```rust
//! use sprig_core::{BaseElement, Component, Context, HookResult, Lifecycle, PropValue, Rendered};
//!
//! struct Badge;
//!
//! impl Component for Badge {
//!     const ATTRS: &'static [&'static str] = &["label"];
//!
//!     fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
//!         cx.declare_property("text", "new");
//!         Ok(())
//!     }
//!
//!     fn will_update(
//!         &self,
//!         cx: &mut Context<'_, Self>,
//!         name: &str,
//!         _old: &PropValue,
//!         new: &PropValue,
//!     ) -> HookResult {
//!         // Mirror the `label` attribute into the `text` property
//!         if name == "label" {
//!             cx.set_property("text", new.clone())?;
//!         }
//!         Ok(())
//!     }
//!
//!     fn render(&self, cx: &Context<'_, Self>) -> Rendered {
//!         let text: String = cx.get("text").unwrap_or_default();
//!         format!("<b>{text}</b>").into()
//!     }
//! }
//!
//! let mut badge = Lifecycle::new(BaseElement::new(), Badge);
//! badge.mount().unwrap();
//! badge.set_attribute("label", Some("sale")).unwrap();
//! assert_eq!(badge.root().inner_html(), "<b>sale</b>");
//! ```

pub mod bus;
pub mod component;
pub mod element;
pub mod error;
pub mod lifecycle;
pub mod reactive;
pub mod registry;
pub mod scope;
pub mod store;

pub use bus::{Envelope, EventBus, ListenerId};
pub use component::{Component, Context, Rendered};
pub use element::{BaseElement, Element};
pub use error::{BusError, CoreError, HookError, HookResult, Result};
pub use lifecycle::{load_requested_styles, Lifecycle, Mountable, Phase, RenderConfig, RenderStats};
pub use reactive::{PropValue, Properties, Reactive};
pub use registry::ElementRegistry;
pub use scope::RenderRoot;
pub use store::{create_store, shared_store, StateRecord, Store, Subscription};

pub use sprig_style;
