//! Listener registry
//!
//! Maps dispatch keys to ordered listener lists using `DashMap`. Each key
//! holds an immutable snapshot that is replaced as a whole on every change,
//! so a dispatch that already cloned the snapshot never sees a half-applied
//! registration or removal.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use events_core::normalize_listener_key;

use crate::listener::{Listener, ListenerOptions};

/// Unique id of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Returned by `register`; pass it back to `unregister`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    id: ListenerId,
    key: String,
}

impl ListenerHandle {
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The normalized dispatch key the listener was registered under
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A listener together with its registration data
#[derive(Clone)]
pub struct RegisteredListener {
    pub id: ListenerId,
    pub listener: Arc<dyn Listener>,
    pub options: ListenerOptions,
}

impl RegisteredListener {
    #[must_use]
    pub fn name(&self) -> &str {
        self.listener.name()
    }
}

impl fmt::Debug for RegisteredListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Listeners of one key, in registration order
pub type Snapshot = Arc<[RegisteredListener]>;

/// Thread-safe mapping from dispatch key to listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<String, Snapshot>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under `key`.
    ///
    /// The key is normalized first, so `"on_ready"`, `"Ready"` and `"ready"`
    /// all land on `ready`. Registering a non-default listener removes any
    /// default listeners for the same key.
    pub fn register(
        &self,
        key: &str,
        listener: Arc<dyn Listener>,
        options: ListenerOptions,
    ) -> ListenerHandle {
        let key = normalize_listener_key(key);
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entry = RegisteredListener {
            id,
            listener,
            options,
        };

        match self.listeners.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                let mut next: Vec<RegisteredListener> = current
                    .iter()
                    .filter(|existing| options.is_default || !existing.options.is_default)
                    .cloned()
                    .collect();

                let replaced = current.len() - next.len();
                if replaced > 0 {
                    tracing::debug!(key = %key, replaced, "Default listeners replaced");
                }

                next.push(entry);
                slot.insert(next.into());
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::from(vec![entry]));
            }
        }

        tracing::debug!(key = %key, listener_id = %id, default = options.is_default, "Listener registered");

        ListenerHandle { id, key }
    }

    /// Remove a registration. Returns `false` if it was already gone.
    ///
    /// Invocations already scheduled from an earlier snapshot still run.
    pub fn unregister(&self, handle: &ListenerHandle) -> bool {
        let removed = match self.listeners.get_mut(handle.key()) {
            Some(mut slot) if slot.iter().any(|l| l.id == handle.id) => {
                let next: Vec<RegisteredListener> =
                    slot.iter().filter(|l| l.id != handle.id).cloned().collect();
                *slot = next.into();
                true
            }
            _ => false,
        };

        // Drop the key entirely once its last listener is gone
        self.listeners
            .remove_if(handle.key(), |_, snapshot| snapshot.is_empty());

        if removed {
            tracing::debug!(key = %handle.key(), listener_id = %handle.id, "Listener unregistered");
        }

        removed
    }

    /// Current listeners for an already-normalized key.
    pub fn listeners_for(&self, key: &str) -> Snapshot {
        self.listeners
            .get(key)
            .map(|snapshot| Arc::clone(snapshot.value()))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn contains(&self, handle: &ListenerHandle) -> bool {
        self.listeners
            .get(handle.key())
            .is_some_and(|snapshot| snapshot.iter().any(|l| l.id == handle.id))
    }

    /// Total number of registrations across all keys
    pub fn len(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Keys with at least one listener, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.listeners.iter().map(|e| e.key().clone()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn clear(&self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("keys", &self.keys())
            .field("len", &self.len())
            .finish()
    }
}
