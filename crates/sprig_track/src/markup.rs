//! Shared copy and markup helpers for the tracking pages

use std::borrow::Cow;

use serde_json::Value;

pub const BRAND_TITLE: &str = "TrackEase Express";
pub const BRAND_SUB: &str = "Internal Tracking Console";

pub const TIMELINE_ORDER_CREATED: &str = "Order Created";
pub const TIMELINE_ORDER_CREATED_SUB: &str = "The sender has placed the order";
pub const TIMELINE_IN_TRANSIT: &str = "In Transit";
pub const TIMELINE_IN_TRANSIT_SUB: &str = "The parcel is on its way";
pub const TIMELINE_DELIVERED: &str = "Delivered";
pub const TIMELINE_DELIVERED_SUB: &str = "The recipient has signed for it";

pub const TRACK_ID: &str = "Tracking ID";
pub const RECIPIENT: &str = "Recipient";
pub const PRODUCT: &str = "Product";
pub const ADDRESS: &str = "Address";
pub const CONTACT: &str = "Contact";
pub const STATUS: &str = "Status";

/// Escape text for HTML element content and quoted attribute values
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escaped display text of `object[key]`, or `fallback` when missing or falsy
///
/// `null`, `false`, `0` and `""` count as falsy. Strings are shown without
/// quotes; other JSON values use their JSON text.
pub fn field<'a>(object: &'a Value, key: &str, fallback: &'a str) -> Cow<'a, str> {
    match object.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Cow::Borrowed(fallback),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Cow::Borrowed(fallback),
        Some(Value::String(text)) if text.is_empty() => Cow::Borrowed(fallback),
        Some(Value::String(text)) => escape(text),
        Some(other) => Cow::Owned(escape(&other.to_string()).into_owned()),
    }
}
