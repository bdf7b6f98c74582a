//! Document change feed with cancellable subscriptions.

use crate::types::DocumentEvent;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&DocumentEvent) + Send + Sync>;

/// A change feed that distributes document events to listeners.
///
/// The feed:
/// - Supports multiple independent subscribers observing the same stream
/// - Removes listeners synchronously and immediately on
///   [`unsubscribe`](Self::unsubscribe); no events are delivered to a
///   listener after its token is removed
/// - Is thread-safe
///
/// Listeners are invoked inline on the emitting call and must not
/// register or cancel subscriptions from inside a callback.
pub struct DocumentFeed {
    /// Registered listeners with their tokens.
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    /// Next token value.
    next_id: AtomicU64,
}

impl DocumentFeed {
    /// Creates a new feed with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a listener, returning its cancellation token.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DocumentEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Box::new(listener)));
        id
    }

    /// Removes a listener by token.
    ///
    /// Returns true if the token was registered. After this returns the
    /// listener will not be invoked again.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Delivers an event to every registered listener, in registration
    /// order.
    pub fn emit(&self, event: &DocumentEvent) {
        let listeners = self.listeners.read();
        tracing::trace!(doc = %event.doc(), listeners = listeners.len(), "emitting document event");
        for (_, listener) in listeners.iter() {
            listener(event);
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for DocumentFeed {
    fn default() -> Self {
        Self::new()
    }
}
