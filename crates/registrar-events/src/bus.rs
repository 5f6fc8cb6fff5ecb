use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Handler<P> = Arc<dyn Fn(&P) -> anyhow::Result<()> + Send + Sync>;

struct Registry<P> {
    next_id: u64,
    handlers: HashMap<String, Vec<(u64, Handler<P>)>>,
}

/// Named publish/subscribe channel carrying payloads of type `P`.
///
/// Cloning is cheap and yields a handle to the same set of subscriptions.
pub struct EventBus<P> {
    registry: Arc<Mutex<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<P: 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let mut events: Vec<_> = registry
            .handlers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}

/// Outcome of a single [`EventBus::emit`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err` or panicked.
    pub failed: usize,
}

impl<P: 'static> EventBus<P> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: HashMap::new(),
            })),
        }
    }

    /// Register `handler` for `event`. The returned [`Subscription`] removes
    /// exactly this registration; other handlers for the same event are untouched.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .handlers
                .entry(event.to_owned())
                .or_default()
                .push((id, Arc::new(handler)));
            id
        };

        let registry = Arc::downgrade(&self.registry);
        let event = event.to_owned();
        Subscription::new(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            let now_empty = match registry.handlers.get_mut(&event) {
                Some(list) => {
                    list.retain(|(handler_id, _)| *handler_id != id);
                    list.is_empty()
                }
                None => false,
            };
            if now_empty {
                registry.handlers.remove(&event);
            }
        })
    }

    /// Invoke every handler registered for `event`, in registration order.
    ///
    /// The handler list is snapshotted before the first call, so handlers may
    /// subscribe or unsubscribe without deadlocking. A failing or panicking
    /// handler is logged and skipped; later handlers still run.
    pub fn emit(&self, event: &str, payload: &P) -> EmitReport {
        let handlers: Vec<Handler<P>> = self
            .lock()
            .handlers
            .get(event)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        let mut report = EmitReport::default();
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(event, handler = index, error = %e, "event handler failed");
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(event, handler = index, "event handler panicked");
                }
            }
        }
        report
    }

    /// Number of handlers currently registered for `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.lock().handlers.get(event).map_or(0, Vec::len)
    }
}

impl<P> EventBus<P> {
    fn lock(&self) -> MutexGuard<'_, Registry<P>> {
        // Handlers never run under the lock, so a poisoned registry is still consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capability to remove the handler(s) registered by a `subscribe` call.
///
/// Dropping it leaves the handlers registered for the life of the bus.
#[must_use = "the handler stays registered until `unsubscribe` is called; use `detach` to keep it"]
pub struct Subscription {
    cancels: Vec<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancels: vec![Box::new(cancel)],
        }
    }

    pub(crate) fn merge(parts: impl IntoIterator<Item = Subscription>) -> Self {
        Self {
            cancels: parts.into_iter().flat_map(|s| s.cancels).collect(),
        }
    }

    /// Deregister every handler this subscription covers.
    pub fn unsubscribe(self) {
        for cancel in self.cancels {
            cancel();
        }
    }

    /// Keep the handlers registered and discard the capability.
    pub fn detach(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("registrations", &self.cancels.len())
            .finish()
    }
}
