use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::notification::domain::face_event::FaceEvent;
use crate::notification::domain::face_snapshot::FaceSnapshot;

pub type EventHandler = Arc<dyn Fn(&Arc<FaceSnapshot>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    event: FaceEvent,
    handler: EventHandler,
}

/// Event handlers keyed by event kind.
///
/// Handlers run synchronously on the dispatching thread. The lock is
/// released before any handler is called, so a handler may subscribe or
/// unsubscribe without deadlocking. A panicking handler is logged and
/// skipped.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event: FaceEvent, handler: F) -> SubscriptionId
    where
        F: Fn(&Arc<FaceSnapshot>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscription {
            id,
            event,
            handler: Arc::new(handler),
        });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Calls every handler for each event, in event order and then
    /// registration order.
    pub fn dispatch(&self, events: &[FaceEvent], snapshot: &Arc<FaceSnapshot>) {
        for &event in events {
            let handlers: Vec<EventHandler> = self
                .lock()
                .iter()
                .filter(|s| s.event == event)
                .map(|s| s.handler.clone())
                .collect();
            for handler in handlers {
                if panic::catch_unwind(AssertUnwindSafe(|| handler(snapshot))).is_err() {
                    log::error!("Handler for '{event}' panicked");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        // Handlers never run under this lock.
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
