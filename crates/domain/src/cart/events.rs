use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::CartLineItem;

/// Changes applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// A product entered the cart with one unit.
    ItemAdded(CartLineItem),

    /// The quantity of a line changed; the ceiling is the one the change was
    /// checked against.
    QuantityChanged {
        product_id: ProductId,
        previous: u32,
        quantity: u32,
        stock_ceiling: u32,
    },

    /// A line was removed.
    ItemRemoved { product_id: ProductId },

    /// Every line was removed.
    Cleared,

    /// The catalog reported a new stock ceiling for a line.
    StockRefreshed {
        product_id: ProductId,
        stock_ceiling: u32,
        quantity: u32,
    },
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "ItemAdded",
            CartEvent::QuantityChanged { .. } => "QuantityChanged",
            CartEvent::ItemRemoved { .. } => "ItemRemoved",
            CartEvent::Cleared => "Cleared",
            CartEvent::StockRefreshed { .. } => "StockRefreshed",
        }
    }
}

impl CartEvent {
    /// Returns the product this event concerns, if it concerns one.
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            CartEvent::ItemAdded(item) => Some(&item.product_id),
            CartEvent::QuantityChanged { product_id, .. }
            | CartEvent::ItemRemoved { product_id }
            | CartEvent::StockRefreshed { product_id, .. } => Some(product_id),
            CartEvent::Cleared => None,
        }
    }
}
