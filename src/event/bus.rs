//! Synchronous publish/subscribe keyed by event name.
//!
//! Subscribers for a name run in subscription order, followed by the wildcard
//! subscribers. The registry lock is released before any subscriber runs, so
//! subscribers may subscribe, unsubscribe or publish from inside a dispatch.
//! Changes made during a dispatch apply from the next publish on.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use super::Event;

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    named: HashMap<String, Vec<(SubscriptionId, Handler)>>,
    wildcard: Vec<(SubscriptionId, Handler)>,
}

impl Registry {
    fn allocate(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events named `name`.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry
            .named
            .entry(name.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Register `handler` for every publish, whatever its name.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.wildcard.push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.wildcard.len();
        registry.wildcard.retain(|(sid, _)| *sid != id);
        if registry.wildcard.len() != before {
            return true;
        }

        let mut removed = false;
        registry.named.retain(|_, handlers| {
            let len = handlers.len();
            handlers.retain(|(sid, _)| *sid != id);
            removed |= handlers.len() != len;
            !handlers.is_empty()
        });
        removed
    }

    /// Number of subscribers that would see an event named `name`,
    /// wildcard subscribers included.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let registry = self.registry.lock();
        registry.named.get(name).map_or(0, Vec::len) + registry.wildcard.len()
    }

    /// Deliver `event` to its named subscribers, then to the wildcard ones.
    ///
    /// A panicking subscriber is logged and skipped; the remaining
    /// subscribers still run.
    pub fn publish(&self, event: &Event) {
        let handlers: Vec<Handler> = {
            let registry = self.registry.lock();
            registry
                .named
                .get(event.name())
                .into_iter()
                .flatten()
                .chain(registry.wildcard.iter())
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(event = %event.name(), "Event subscriber panicked");
            }
        }
    }
}
