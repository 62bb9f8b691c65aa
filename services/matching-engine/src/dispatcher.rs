//! Type-indexed publish/subscribe dispatcher
//!
//! Events are routed by their runtime type: subscribing for `E` registers a
//! callback that fires for every published `E`, in registration order, on
//! the publishing thread. Registration is thread-safe; the registry mutex is
//! never held across a callback, so subscribers may subscribe or publish
//! from inside a callback without deadlocking.
//!
//! Subscribers must be fast and non-blocking (they run on the engine's
//! worker thread) and must not re-enter the engine synchronously.

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type ErasedCallback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Multicast event bus keyed by event type
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Mutex<HashMap<TypeId, Vec<ErasedCallback>>>,
}

impl EventDispatcher {
    /// Create a new dispatcher with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for events of type `E`
    ///
    /// The same callback may be registered multiple times and will be
    /// invoked once per registration.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Any,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapper: ErasedCallback = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(event);
            }
        });

        self.subscribers
            .lock()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapper);
    }

    /// Deliver an event to every callback registered for its type
    ///
    /// The callback list is copied out under the lock and invoked outside
    /// it. A panicking subscriber is logged and swallowed; later
    /// subscribers still see the event.
    pub fn publish<E: Any>(&self, event: &E) {
        let callbacks: Vec<ErasedCallback> = {
            let subscribers = self.subscribers.lock();
            match subscribers.get(&TypeId::of::<E>()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(
                    event_type = std::any::type_name::<E>(),
                    "event subscriber panicked; continuing with remaining subscribers"
                );
            }
        }
    }

    /// Number of callbacks registered for events of type `E`
    pub fn subscriber_count<E: Any>(&self) -> usize {
        self.subscribers
            .lock()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}
