//! Order payloads carried between the login and dashboard pages
//!
//! The login page hands the order to the dashboard through the URL:
//! `/dashboard?orders=<percent-encoded JSON>`. The dashboard accepts either
//! an `order` or an `orders` parameter.

use std::fmt;

use serde_json::Value;
use url::form_urlencoded;

use crate::error::Result;

/// Path of the dashboard page
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Delivery stage derived from an order's free-form `status` text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    OrderCreated,
    InTransit,
    Delivered,
}

impl OrderStatus {
    /// Classify a status string, case-insensitively
    ///
    /// "delivered" anywhere wins over everything else. Anything that does not
    /// mention "order create" is treated as in transit, including an empty
    /// status.
    pub fn classify(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("delivered") {
            OrderStatus::Delivered
        } else if status.contains("order create") {
            OrderStatus::OrderCreated
        } else {
            OrderStatus::InTransit
        }
    }

    /// Classify the `status` field of an order object
    pub fn of(order: &Value) -> Self {
        Self::classify(order.get("status").and_then(Value::as_str).unwrap_or(""))
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::OrderCreated => "Order Created",
            OrderStatus::InTransit => "In Transit",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Class list of the status pill
    pub fn pill_class(self) -> &'static str {
        match self {
            OrderStatus::OrderCreated => "status-pill default",
            OrderStatus::InTransit => "status-pill in-transit",
            OrderStatus::Delivered => "status-pill delivered",
        }
    }

    /// Whether the timeline step for `stage` is reached
    pub fn reached(self, stage: OrderStatus) -> bool {
        self.rank() >= stage.rank()
    }

    fn rank(self) -> u8 {
        match self {
            OrderStatus::OrderCreated => 0,
            OrderStatus::InTransit => 1,
            OrderStatus::Delivered => 2,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw (decoded) order parameter from a query string
///
/// Accepts a leading `?`. `order` takes precedence over `orders`; empty
/// values count as absent.
pub fn order_param(query: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect();

    ["order", "orders"].iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(key, value)| key == *wanted && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

/// Parse the order carried in a query string
///
/// `Ok(None)` when no order parameter is present; an error when it is
/// present but not valid JSON.
pub fn parse_order_query(query: &str) -> Result<Option<Value>> {
    match order_param(query) {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Dashboard URL carrying `order` as percent-encoded JSON
pub fn dashboard_url(order: &Value) -> String {
    let json = order.to_string();
    let encoded: String = form_urlencoded::byte_serialize(json.as_bytes()).collect();
    format!("{DASHBOARD_PATH}?orders={encoded}")
}
