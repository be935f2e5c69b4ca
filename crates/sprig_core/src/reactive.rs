//! Reactive properties
//!
//! A reactive property is a named value on a component instance whose
//! mutation requests a render pass. This module provides the storage side:
//!
//! - [`Reactive<T>`]: a typed cell with change detection and a version counter
//! - [`Properties`]: the per-instance, insertion-ordered map from property
//!   name to `Reactive<PropValue>`
//!
//! The write path that invokes `will_update` and renders lives on the
//! component [`Context`](crate::component::Context), which owns the
//! instance-wide view needed to run hooks.
//!
//! # Example
//!
//! ```rust
//! use sprig_core::reactive::Reactive;
//!
//! let mut count = Reactive::new(0);
//! let mut seen = Vec::new();
//!
//! // Equal writes are no-ops
//! assert!(!count.set(0, |old, new| seen.push((*old, *new))));
//!
//! // The callback runs before the value is replaced
//! assert!(count.set(1, |old, new| seen.push((*old, *new))));
//! assert_eq!(seen, vec![(0, 1)]);
//! assert_eq!(*count.get(), 1);
//! assert_eq!(count.version(), 1);
//! ```

use indexmap::IndexMap;
use tracing::trace;

/// Dynamically typed property value
///
/// JSON-shaped so that attribute strings, demo payloads and typed values
/// (via serde) all share one representation.
pub type PropValue = serde_json::Value;

/// A typed reactive cell
///
/// Writes that compare equal (`PartialEq`) are ignored. A changing write
/// invokes its callback with `(old, new)` before the value is replaced and
/// bumps the version counter.
#[derive(Debug, Clone, Default)]
pub struct Reactive<T> {
    value: T,
    version: u64,
}

impl<T> Reactive<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            version: 0,
        }
    }

    /// Current value
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Number of changing writes since construction
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the value unconditionally, returning the previous one
    pub fn replace(&mut self, value: T) -> T {
        self.version += 1;
        std::mem::replace(&mut self.value, value)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: PartialEq> Reactive<T> {
    /// Whether writing `candidate` would count as a change
    pub fn differs(&self, candidate: &T) -> bool {
        self.value != *candidate
    }

    /// Write a value, calling `on_change(old, new)` first if it differs
    ///
    /// Returns whether the value changed.
    pub fn set<F>(&mut self, value: T, on_change: F) -> bool
    where
        F: FnOnce(&T, &T),
    {
        if !self.differs(&value) {
            return false;
        }
        on_change(&self.value, &value);
        self.replace(value);
        true
    }
}

/// Per-instance map from property name to reactive value
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: IndexMap<String, Reactive<PropValue>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a property
    ///
    /// Redeclaring an existing name silently replaces it (last write wins)
    /// and resets its version. Returns the replaced value, if any.
    pub fn declare(&mut self, name: impl Into<String>, initial: impl Into<PropValue>) -> Option<PropValue> {
        let name = name.into();
        let previous = self
            .entries
            .insert(name.clone(), Reactive::new(initial.into()))
            .map(Reactive::into_inner);
        trace!(property = %name, redeclared = previous.is_some(), "declared property");
        previous
    }

    /// Install several properties in iteration order
    pub fn declare_all<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropValue>,
    {
        for (name, initial) in properties {
            self.declare(name, initial);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name).map(Reactive::get)
    }

    pub fn reactive(&self, name: &str) -> Option<&Reactive<PropValue>> {
        self.entries.get(name)
    }

    pub fn version(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(Reactive::version)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Property names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.get()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a new value without change detection
    ///
    /// Returns the previous value, or `None` if the property is undeclared.
    pub(crate) fn replace(&mut self, name: &str, value: PropValue) -> Option<PropValue> {
        self.entries.get_mut(name).map(|cell| cell.replace(value))
    }
}
