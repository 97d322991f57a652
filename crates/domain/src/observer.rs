//! Mutate-then-notify plumbing for UI layers.

use std::sync::Arc;

/// Receives events after a mutation has been applied and persisted.
pub trait Observer<E>: Send + Sync {
    /// Called once per event, in the order the events were applied.
    fn notify(&self, event: &E);
}

impl<E, F> Observer<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn notify(&self, event: &E) {
        self(event)
    }
}

/// Registered observers of one event type.
pub struct Observers<E> {
    observers: Vec<Arc<dyn Observer<E>>>,
}

impl<E> Observers<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Registers an observer.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer<E>>) {
        self.observers.push(observer);
    }

    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers every event to every observer.
    pub fn notify_all(&self, events: &[E]) {
        for event in events {
            for observer in &self.observers {
                observer.notify(event);
            }
        }
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.len())
            .finish()
    }
}
