//! One-shot waiters behind `Dispatcher::wait_for`

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use events_core::{Event, WILDCARD_KEY};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub(crate) type WaitCheck = Box<dyn Fn(&Arc<dyn Event>) -> bool + Send + Sync>;

/// Identifies one waiter inside its key's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WaiterId(u64);

struct Waiter {
    id: WaiterId,
    check: WaitCheck,
    /// Taken by whichever resolution fires first
    tx: Mutex<Option<oneshot::Sender<Arc<dyn Event>>>>,
}

impl Waiter {
    fn is_done(&self) -> bool {
        self.tx.lock().as_ref().is_none_or(oneshot::Sender::is_closed)
    }

    fn fire(&self, event: &Arc<dyn Event>) -> bool {
        match self.tx.lock().take() {
            Some(tx) => tx.send(Arc::clone(event)).is_ok(),
            None => false,
        }
    }
}

#[derive(Default)]
pub(crate) struct WaiterSet {
    waiters: DashMap<String, Vec<Arc<Waiter>>>,
    next_id: AtomicU64,
}

impl WaiterSet {
    /// Register a waiter on `key`, pruning waiters on the same key whose
    /// receiver is already gone.
    pub(crate) fn add(
        &self,
        key: String,
        check: WaitCheck,
    ) -> (WaiterId, oneshot::Receiver<Arc<dyn Event>>) {
        let (tx, rx) = oneshot::channel();
        let id = WaiterId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut waiters = self.waiters.entry(key).or_default();
        waiters.retain(|waiter| !waiter.is_done());
        waiters.push(Arc::new(Waiter {
            id,
            check,
            tx: Mutex::new(Some(tx)),
        }));

        (id, rx)
    }

    /// Forget a waiter that gave up (timed out or was dropped).
    pub(crate) fn remove(&self, key: &str, id: WaiterId) {
        if let Some(mut waiters) = self.waiters.get_mut(key) {
            waiters.retain(|waiter| waiter.id != id);
        }
        self.waiters.remove_if(key, |_, waiters| waiters.is_empty());
    }

    /// Hand `event` to every waiter on its key (and the wildcard) whose check passes.
    pub(crate) fn resolve(&self, event: &Arc<dyn Event>) -> usize {
        let key = event.resolved_name();
        let mut resolved = self.resolve_key(key, event);
        if key != WILDCARD_KEY {
            resolved += self.resolve_key(WILDCARD_KEY, event);
        }
        resolved
    }

    fn resolve_key(&self, key: &str, event: &Arc<dyn Event>) -> usize {
        // Waiters stay registered while checks run; checks see a snapshot
        // taken outside the map lock so they may dispatch reentrantly.
        let snapshot: Vec<Arc<Waiter>> = match self.waiters.get(key) {
            Some(waiters) => waiters.clone(),
            None => return 0,
        };

        let mut resolved = 0;
        let mut finished = Vec::new();
        for waiter in snapshot {
            if waiter.is_done() {
                finished.push(waiter.id);
                continue;
            }

            let matched = catch_unwind(AssertUnwindSafe(|| (waiter.check)(event)))
                .unwrap_or_else(|_| {
                    tracing::warn!(key = %key, "wait_for check panicked; treating as no match");
                    false
                });

            if matched {
                if waiter.fire(event) {
                    resolved += 1;
                }
                finished.push(waiter.id);
            }
        }

        if !finished.is_empty() {
            if let Some(mut waiters) = self.waiters.get_mut(key) {
                waiters.retain(|waiter| !finished.contains(&waiter.id));
            }
            self.waiters.remove_if(key, |_, waiters| waiters.is_empty());
        }

        resolved
    }

    /// Drop every waiter; their receivers observe a closed channel.
    pub(crate) fn clear(&self) {
        self.waiters.clear();
    }

    /// Number of registered waiters across all keys
    pub(crate) fn len(&self) -> usize {
        self.waiters.iter().map(|entry| entry.value().len()).sum()
    }
}
