//! Order dashboard component (`<track-dashboard>`)
//!
//! Reads the order from the page's query string on connect and renders a
//! summary card, a delivery timeline and an order table. A malformed order
//! parameter is logged and ignored; the page then renders with an empty
//! order.

use std::fmt::Write as _;

use serde_json::Value;
use sprig_core::{Component, Context, HookResult, Rendered};
use tracing::{debug, warn};

use crate::markup::{self, field};
use crate::order::{parse_order_query, OrderStatus};

pub const TAG: &str = "track-dashboard";

/// Dashboard consumer
#[derive(Debug, Clone, Default)]
pub struct TrackDashboard {
    query: String,
    styles: Option<String>,
}

impl TrackDashboard {
    /// Dashboard for a page whose query string is `query`
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            styles: None,
        }
    }

    /// Stylesheet to request on connect
    pub fn with_styles(mut self, locator: impl Into<String>) -> Self {
        self.styles = Some(locator.into());
        self
    }

    fn summary_card(out: &mut String, order: &Value, status: OrderStatus) {
        let _ = write!(
            out,
            r#"<div class="summary-card">
  <div class="summary-main">
    <div class="summary-title-row">
      <div class="summary-title">Order Details</div>
      <span class="{pill}">{label}</span>
    </div>
    <div class="summary-sub">Details for the parcel you are tracking</div>
    <div class="summary-grid">
"#,
            pill = status.pill_class(),
            label = status.label(),
        );
        for (label, key) in [
            (markup::TRACK_ID, "orderId"),
            (markup::RECIPIENT, "recipient"),
            (markup::PRODUCT, "product"),
            (markup::ADDRESS, "address"),
            (markup::CONTACT, "phone"),
        ] {
            let _ = write!(
                out,
                "      <div><div class=\"field-label\">{label}</div><div class=\"field-value\">{}</div></div>\n",
                field(order, key, "-"),
            );
        }
        out.push_str("    </div>\n  </div>\n");

        out.push_str("  <div class=\"summary-side\">\n    <div class=\"timeline-label\">Delivery Progress</div>\n");
        for (stage, main, sub) in [
            (
                OrderStatus::OrderCreated,
                markup::TIMELINE_ORDER_CREATED,
                markup::TIMELINE_ORDER_CREATED_SUB,
            ),
            (
                OrderStatus::InTransit,
                markup::TIMELINE_IN_TRANSIT,
                markup::TIMELINE_IN_TRANSIT_SUB,
            ),
            (
                OrderStatus::Delivered,
                markup::TIMELINE_DELIVERED,
                markup::TIMELINE_DELIVERED_SUB,
            ),
        ] {
            let dot = if status.reached(stage) { "active" } else { "inactive" };
            let _ = write!(
                out,
                r#"    <div class="timeline-item">
      <div class="dot {dot}"></div>
      <div><div class="timeline-text-main">{main}</div><div class="timeline-text-sub">{sub}</div></div>
    </div>
"#
            );
        }
        out.push_str("  </div>\n</div>\n");
    }

    fn order_table(out: &mut String, order: &Value) {
        out.push_str("<h2>Order List</h2>\n<table>\n  <thead>\n    <tr>");
        for heading in [
            markup::TRACK_ID,
            markup::RECIPIENT,
            markup::PRODUCT,
            markup::ADDRESS,
            markup::CONTACT,
            markup::STATUS,
        ] {
            let _ = write!(out, "<th>{heading}</th>");
        }
        out.push_str("</tr>\n  </thead>\n  <tbody>\n    <tr>");
        for key in ["orderId", "recipient", "product", "address", "phone", "status"] {
            let _ = write!(out, "<td>{}</td>", field(order, key, ""));
        }
        out.push_str("</tr>\n  </tbody>\n</table>\n");
    }
}

impl Component for TrackDashboard {
    fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
        let order = match parse_order_query(&self.query) {
            Ok(Some(order)) => {
                debug!(status = %OrderStatus::of(&order), "order loaded from query");
                order
            }
            Ok(None) => Value::Null,
            Err(e) => {
                warn!(error = %e, "Failed to parse order from query");
                Value::Null
            }
        };
        cx.declare_property("order", order);

        if let Some(locator) = &self.styles {
            cx.apply_styles(locator.clone());
        }
        Ok(())
    }

    fn render(&self, cx: &Context<'_, Self>) -> Rendered {
        let empty = Value::Object(Default::default());
        let order = match cx.property("order") {
            Some(Value::Null) | None => &empty,
            Some(order) => order,
        };
        let status = OrderStatus::of(order);

        let mut out = String::with_capacity(4096);
        let _ = write!(
            out,
            r#"<div class="page">
<div class="top-bar">
  <div class="brand">
    <div class="brand-logo">📦</div>
    <div><div class="brand-title">{}</div><div class="brand-sub">{}</div></div>
  </div>
  <a class="back-link" href="/login">← Back</a>
</div>
"#,
            markup::BRAND_TITLE,
            markup::BRAND_SUB,
        );
        Self::summary_card(&mut out, order, status);
        Self::order_table(&mut out, order);
        out.push_str("</div>");
        out.into()
    }
}
