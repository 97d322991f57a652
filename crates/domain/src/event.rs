//! Domain event trait shared by the cart and the checkout session.

use serde::Serialize;

/// Trait for domain events.
///
/// Domain events describe a state change that has already been applied and
/// persisted. They are named in past tense and delivered to observers.
pub trait DomainEvent: Serialize + Send + Sync + Clone + std::fmt::Debug {
    /// Returns the event type name, used in logs and metrics labels.
    fn event_type(&self) -> &'static str;
}
