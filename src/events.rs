//! World-change subscriptions

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::world::{BlockPos, BlockState};

type Listener = Arc<dyn Fn(BlockPos, &BlockState) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Fan-out of block placement events to subscribers.
///
/// Cloning shares the same listener set.
#[derive(Clone, Default)]
pub struct BlockEventBus {
    inner: Arc<BusInner>,
}

impl BlockEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(BlockPos, &BlockState) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Deliver a placement to every listener, in subscription order.
    /// Listeners may subscribe or unsubscribe while being called.
    pub fn publish(&self, pos: BlockPos, state: &BlockState) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(pos, state);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration handle; unsubscribes when dropped
pub struct Subscription {
    bus: Weak<BusInner>,
    id: Option<u64>,
}

impl Subscription {
    /// Unsubscribe now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(id), Some(bus)) = (self.id.take(), self.bus.upgrade()) {
            bus.remove(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
