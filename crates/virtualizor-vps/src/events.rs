//! Lifecycle notifications.
//!
//! Each client owns an [`EventBus`]: a table from event to the ordered list of
//! subscribers registered for it. Publishing runs the matching subscribers
//! synchronously, in registration order, after the operation's HTTP exchange
//! has completed. A failing or panicking subscriber is logged and skipped; it
//! never affects other subscribers or the operation's own result.

use crate::models::{LifecycleResult, Reply};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Lifecycle events published by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A VPS was created
    Created,
    /// A VPS was started
    Started,
    /// A VPS was stopped
    Stopped,
    /// A VPS was restarted
    Restarted,
}

impl LifecycleEvent {
    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Restarted => "restarted",
        }
    }

    /// Returns all events.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Created, Self::Started, Self::Stopped, Self::Restarted]
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A published notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Which lifecycle change happened.
    pub kind: LifecycleEvent,
    /// The operation's result, raw or normalized as configured.
    pub payload: Reply<LifecycleResult>,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Registration table of lifecycle subscribers.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<LifecycleEvent, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    pub fn subscribe<F>(&self, event: LifecycleEvent, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        for handlers in table.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sid, _)| *sid == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of subscribers registered for `event`.
    #[must_use]
    pub fn subscriber_count(&self, event: LifecycleEvent) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to its subscribers. Returns how many completed without error.
    pub fn publish(&self, event: &Event) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();

        debug!(event = %event.kind, subscribers = handlers.len(), "Publishing lifecycle event");

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    warn!(event = %event.kind, subscription = id.0, error = %err, "Lifecycle subscriber failed");
                }
                Err(_) => {
                    warn!(event = %event.kind, subscription = id.0, "Lifecycle subscriber panicked");
                }
            }
        }
        delivered
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = table.iter().map(|(k, v)| (k.name(), v.len())).collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}
