//! Event bus
//!
//! A named-event publish/subscribe channel for decoupled communication
//! between components. Delivery is synchronous: `emit` calls every listener
//! registered for the event, in registration order, before it returns.
//!
//! # Example
//!
//! ```rust
//! use sprig_core::bus::EventBus;
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let id = bus.on("track:login", |envelope| {
//!     assert_eq!(envelope.detail["user"], "xxx");
//!     Ok(())
//! });
//!
//! bus.emit("track:login", json!({ "user": "xxx" })).unwrap();
//! assert!(bus.off("track:login", id));
//! ```
//!
//! A process-wide bus is available through [`init_event_bus`],
//! [`event_bus`] and the free functions [`on`], [`off`] and [`emit`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{BusError, HookResult};
use crate::reactive::PropValue;

/// Identifies one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// What listeners receive
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub detail: PropValue,
}

type Listener = Arc<dyn Fn(&Envelope) -> HookResult + Send + Sync>;

type Listeners = SmallVec<[(ListenerId, Listener); 4]>;

/// Named-event dispatcher
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<FxHashMap<String, Listeners>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`
    ///
    /// Registering the same callback twice yields two independent
    /// registrations, each called on every emit.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&Envelope) -> HookResult + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let event = event.into();
        trace!(event = %event, ?id, "listener added");
        self.listeners
            .lock()
            .unwrap()
            .entry(event)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove one registration; `false` if it was not registered
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let Some(registered) = listeners.get_mut(event) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|(existing, _)| *existing != id);
        let removed = registered.len() != before;
        if registered.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Deliver `detail` to every listener of `event`
    ///
    /// Listeners registered at the time of the call are invoked in order. The
    /// first failing listener stops delivery and its error is returned.
    pub fn emit(&self, event: &str, detail: impl Into<PropValue>) -> Result<(), BusError> {
        let snapshot: Listeners = match self.listeners.lock().unwrap().get(event) {
            Some(registered) => registered.clone(),
            None => return Ok(()),
        };

        let envelope = Envelope {
            event: event.to_string(),
            detail: detail.into(),
        };
        debug!(event, listeners = snapshot.len(), "emitting");

        for (index, (_, listener)) in snapshot.iter().enumerate() {
            listener(&envelope).map_err(|source| BusError::Listener {
                event: event.to_string(),
                index,
                source,
            })?;
        }
        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .get(event)
            .map_or(0, SmallVec::len)
    }

    /// Remove every listener for every event
    pub fn clear(&self) {
        self.listeners.lock().unwrap().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock().unwrap();
        let counts: FxHashMap<&str, usize> = listeners
            .iter()
            .map(|(event, registered)| (event.as_str(), registered.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

// =============================================================================
// GLOBAL BUS
// =============================================================================

static GLOBAL_BUS: Mutex<Option<Arc<EventBus>>> = Mutex::new(None);

/// Install the process-wide bus if it does not exist yet
pub fn init_event_bus() -> Arc<EventBus> {
    GLOBAL_BUS
        .lock()
        .unwrap()
        .get_or_insert_with(|| {
            debug!("event bus initialized");
            Arc::new(EventBus::new())
        })
        .clone()
}

/// The process-wide bus, initialized on first use
pub fn event_bus() -> Arc<EventBus> {
    init_event_bus()
}

/// Drop the process-wide bus and every listener on it
///
/// Handles obtained earlier keep the old bus alive but are no longer
/// reachable through [`event_bus`].
pub fn reset_event_bus() {
    if let Some(bus) = GLOBAL_BUS.lock().unwrap().take() {
        bus.clear();
    }
}

/// [`EventBus::on`] on the process-wide bus
pub fn on<F>(event: impl Into<String>, callback: F) -> ListenerId
where
    F: Fn(&Envelope) -> HookResult + Send + Sync + 'static,
{
    event_bus().on(event, callback)
}

/// [`EventBus::off`] on the process-wide bus
pub fn off(event: &str, id: ListenerId) -> bool {
    event_bus().off(event, id)
}

/// [`EventBus::emit`] on the process-wide bus
pub fn emit(event: &str, detail: impl Into<PropValue>) -> Result<(), BusError> {
    event_bus().emit(event, detail)
}
