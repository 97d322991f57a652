use common::{AddressId, OrderNumber};
use serde::Serialize;

use crate::event::DomainEvent;

use super::{FreightSelection, PaymentMethod};

/// Changes to a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CheckoutEvent {
    FreightSelected(FreightSelection),

    /// The address book returned the shopper's saved addresses.
    AddressesOffered { count: usize },

    AddressConfirmed { address_id: AddressId },

    PaymentSelected { method: PaymentMethod },

    /// An order was placed and the selections were cleared.
    Completed {
        order_number: OrderNumber,
        cart_cleared: bool,
    },

    /// The selections were discarded without placing an order.
    Cleared,
}

impl DomainEvent for CheckoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CheckoutEvent::FreightSelected(_) => "FreightSelected",
            CheckoutEvent::AddressesOffered { .. } => "AddressesOffered",
            CheckoutEvent::AddressConfirmed { .. } => "AddressConfirmed",
            CheckoutEvent::PaymentSelected { .. } => "PaymentSelected",
            CheckoutEvent::Completed { .. } => "Completed",
            CheckoutEvent::Cleared => "Cleared",
        }
    }
}
