//! Change subscriptions.
//!
//! Each entity kind keeps its own list of callbacks. After a successful
//! write the service re-fetches the full list and hands it to every
//! subscriber. Subscriptions are independent: dropping one leaves the
//! others in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Subscribers<T> {
    next_id: AtomicU64,
    slots: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Subscribers<T> {
    fn slots(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Callback<T>)>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, callback: impl Fn(&[T]) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        slots.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Invoke every callback with `items`. Callbacks run outside the lock,
    /// so they may subscribe or unsubscribe.
    pub fn emit(&self, items: &[T]) {
        let callbacks: Vec<Callback<T>> = self.slots().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback(items);
        }
    }
}
