//! Shopping cart: line items, stock-bounded quantities and persistence.

mod contents;
mod engine;
mod events;
mod line_item;

pub use contents::Cart;
pub use engine::CartEngine;
pub use events::CartEvent;
pub use line_item::{CartLineItem, Product};

use common::{Money, ProductId};
use thiserror::Error;

/// Refusals of cart operations.
///
/// These are warnings for the shopper, not failures of the system: the
/// operation that produced one left the cart exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product has no stock at all.
    #[error("Product {product_id} is out of stock")]
    OutOfStock { product_id: ProductId },

    /// The requested quantity would exceed the available stock.
    #[error("Stock limit reached for {product_id}: at most {stock_ceiling} available")]
    StockLimitReached {
        product_id: ProductId,
        stock_ceiling: u32,
    },

    /// The requested quantity is below the minimum of one unit.
    #[error("Invalid quantity: {quantity} (the minimum is 1)")]
    InvalidQuantity { quantity: u32 },

    /// The catalog supplied a negative price.
    #[error("Invalid price for {product_id}: {price}")]
    InvalidPrice { product_id: ProductId, price: Money },

    /// A stored cart lists the same product on more than one line.
    #[error("Product {product_id} appears on more than one cart line")]
    DuplicateLine { product_id: ProductId },
}
