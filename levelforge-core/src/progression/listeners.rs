//! Event subscriptions.
//!
//! Handlers run after the manager has committed its state and released its
//! lock. A handler that panics is isolated: the panic is caught, logged and
//! counted, and the remaining handlers still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use super::events::{EventKind, ProgressionEvent};

/// Callback invoked for every event of the subscribed kind.
pub type EventHandler = Arc<dyn Fn(&ProgressionEvent) + Send + Sync>;

/// Handle returned by `on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registered handlers, in subscription order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventKind, EventHandler)>,
}

impl ListenerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    pub fn subscribe(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _, _)| *sid != id);
        before != self.handlers.len()
    }

    /// Handlers subscribed to `kind`, cloned so the caller can drop the lock.
    #[must_use]
    pub fn handlers_for(&self, kind: EventKind) -> Vec<EventHandler> {
        self.handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Call each handler with `event`; returns how many panicked.
pub fn dispatch(handlers: &[EventHandler], event: &ProgressionEvent) -> u64 {
    let mut failures = 0;
    for handler in handlers {
        if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
            failures += 1;
            warn!(
                kind = %event.kind(),
                agent = %event.agent_id(),
                "Progression event handler panicked; continuing"
            );
        }
    }
    failures
}
