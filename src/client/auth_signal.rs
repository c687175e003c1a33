use dashmap::DashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub type AuthListener = Arc<dyn Fn() + Send + Sync>;

type Listeners = DashMap<u64, AuthListener>;

/// Payload-less "auth changed" broadcast. Listeners re-query the session
/// themselves.
pub struct AuthSignal {
    listeners: Arc<Listeners>,
    next_id: AtomicU64,
}

impl AuthSignal {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Calls every current listener synchronously. A panicking listener is
    /// logged and skipped.
    pub fn publish(&self) {
        let snapshot: Vec<AuthListener> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tracing::trace!(listeners = snapshot.len(), "publishing auth change");

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                tracing::warn!("auth listener panicked; continuing with the rest");
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for AuthSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its listener when dropped.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(&self.id);
        }
    }
}
