//! Shared state store
//!
//! A small shared-state container: a JSON record that any component can read,
//! shallow-merge into, and subscribe to. Unlike reactive properties, store
//! writes do not render anything by themselves; subscribers decide what to do.
//!
//! # Example
//!
//! ```rust
//! use sprig_core::store::create_store;
//! use serde_json::json;
//!
//! let store = create_store([("a", json!(0)), ("b", json!(2))]);
//! let subscription = store.subscribe(|state| {
//!     assert_eq!(state["a"], json!(1));
//! });
//!
//! store.set_state([("a", json!(1))]);
//! assert_eq!(store.get_state()["b"], json!(2));
//! subscription.unsubscribe();
//! ```
//!
//! Named stores shared across the process are available through
//! [`shared_store`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, RwLock, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::reactive::PropValue;

/// The record held by a store
pub type StateRecord = serde_json::Map<String, PropValue>;

type Subscriber = Arc<dyn Fn(&StateRecord) + Send + Sync>;

struct StoreInner {
    state: RwLock<Arc<StateRecord>>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a shared state record
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(initial: StateRecord) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(initial)),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current record
    pub fn get_state(&self) -> StateRecord {
        StateRecord::clone(&self.inner.state.read().unwrap())
    }

    /// Current value of one key
    pub fn get(&self, key: &str) -> Option<PropValue> {
        self.inner.state.read().unwrap().get(key).cloned()
    }

    /// Shallow-merge `partial` into the record, then notify every subscriber
    ///
    /// Keys in `partial` overwrite existing ones; other keys are untouched.
    /// Subscribers run in registration order, even if nothing changed.
    pub fn set_state<I, K, V>(&self, partial: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropValue>,
    {
        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            let record = Arc::make_mut(&mut state);
            for (key, value) in partial {
                record.insert(key.into(), value.into());
            }
            state.clone()
        };

        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect();
        trace!(keys = snapshot.len(), subscribers = subscribers.len(), "state updated");

        for subscriber in subscribers {
            subscriber(&*snapshot);
        }
    }

    /// Register `callback` to run after every `set_state`
    ///
    /// The same callback registered twice is called twice.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StateRecord) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StateRecord::new())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.read().unwrap())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for one subscription
///
/// Dropping the handle keeps the subscription; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove exactly this registration
    ///
    /// Returns `false` if the store is gone.
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.store.upgrade() else {
            return false;
        };
        let mut subscribers = inner.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != self.id);
        subscribers.len() != before
    }
}

/// Create a store from initial key/value pairs
pub fn create_store<I, K, V>(initial: I) -> Store
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropValue>,
{
    Store::new(
        initial
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
    )
}

// =============================================================================
// GLOBAL STORE REGISTRY
// =============================================================================

static STORE_REGISTRY: LazyLock<Mutex<FxHashMap<String, Store>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Get the named process-wide store, creating an empty one if needed
pub fn shared_store(name: &str) -> Store {
    STORE_REGISTRY
        .lock()
        .unwrap()
        .entry(name.to_string())
        .or_insert_with(|| {
            debug!(store = name, "shared store created");
            Store::default()
        })
        .clone()
}

/// Remove a named store from the registry
///
/// Existing handles keep working but are detached from the name.
pub fn remove_store(name: &str) -> Option<Store> {
    STORE_REGISTRY.lock().unwrap().remove(name)
}

/// Clear all stores from the registry
pub fn clear_all_stores() {
    STORE_REGISTRY.lock().unwrap().clear();
}
